//! Sidecar error types

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Realm announced in `WWW-Authenticate` challenges.
pub const AUTH_REALM: &str = "linodemcp metrics";

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("metrics server is already running")]
    AlreadyRunning,

    #[error("metrics server is not running")]
    NotRunning,

    #[error("TLS configuration failed: {0}")]
    TlsConfig(String),

    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("authentication required")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("graceful shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("port {0} is outside 0..=65535")]
    InvalidPort(i64),
}

impl SidecarError {
    pub fn status(&self) -> StatusCode {
        match self {
            SidecarError::AlreadyRunning | SidecarError::NotRunning => StatusCode::CONFLICT,
            SidecarError::TlsConfig(_) | SidecarError::BindFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SidecarError::Unauthorized => StatusCode::UNAUTHORIZED,
            SidecarError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            SidecarError::ShutdownTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SidecarError::InvalidPort(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for SidecarError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        if matches!(self, SidecarError::Unauthorized) {
            let challenge = format!("Basic realm=\"{}\"", AUTH_REALM);
            if let Ok(value) = HeaderValue::from_str(&challenge) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SidecarError::AlreadyRunning.status(), StatusCode::CONFLICT);
        assert_eq!(SidecarError::NotRunning.status(), StatusCode::CONFLICT);
        assert_eq!(SidecarError::TlsConfig("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(SidecarError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SidecarError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            SidecarError::ShutdownTimeout(Duration::from_secs(1)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = SidecarError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
        assert_eq!(challenge, "Basic realm=\"linodemcp metrics\"");
    }
}
