//! Request middleware, outermost first:
//!
//! | Layer | Effect |
//! |-------|--------|
//! | [`security_headers`] | hardening headers on every response (HSTS only under TLS); request counter |
//! | [`rate_limit`] | shared token bucket; `429` when empty |
//! | [`basic_auth`] | `401` challenge on protected paths when credentials are configured |
//! | [`catch_panic`] | handler panic becomes `500` |

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt;
use subtle::ConstantTimeEq;
use tracing::{debug, error, warn};

use super::config::BasicAuthCredentials;
use super::error::SidecarError;
use super::state::SidecarState;

/// Paths that require credentials when basic auth is configured.
pub const PROTECTED_PATHS: &[&str] = &["/metrics", "/provider/health"];

/// Paths reported by name in the request counter.
const KNOWN_PATHS: &[&str] = &["/", "/health", "/metrics", "/provider/health"];

pub async fn security_headers(State(state): State<Arc<SidecarState>>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'"),
    );
    if state.tls_enabled {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    let label = if KNOWN_PATHS.contains(&path.as_str()) {
        path.as_str()
    } else {
        "other"
    };
    state.metrics.http_request(label, response.status().as_u16());
    response
}

pub async fn rate_limit(State(state): State<Arc<SidecarState>>, request: Request, next: Next) -> Response {
    if !state.limiter.try_acquire() {
        debug!(path = %request.uri().path(), "Rate limit exceeded");
        return SidecarError::RateLimited.into_response();
    }
    next.run(request).await
}

pub async fn basic_auth(State(state): State<Arc<SidecarState>>, request: Request, next: Next) -> Response {
    let Some(expected) = &state.auth else {
        return next.run(request).await;
    };
    if !PROTECTED_PATHS.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    if credentials_match(request.headers(), expected) {
        next.run(request).await
    } else {
        warn!(path = %request.uri().path(), "Rejected unauthenticated request");
        SidecarError::Unauthorized.into_response()
    }
}

pub async fn catch_panic(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            error!(path = %path, "Sidecar handler panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

/// Constant-time comparison of both the username and the password.
fn credentials_match(headers: &HeaderMap, expected: &BasicAuthCredentials) -> bool {
    let Some((username, password)) = basic_credentials(headers) else {
        return false;
    };
    let user_ok = username.as_bytes().ct_eq(expected.username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(expected.password.as_bytes());
    (user_ok & pass_ok).into()
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_basic_credentials_parse() {
        let encoded = STANDARD.encode("scraper:pa:ss");
        let headers = headers_with(&format!("Basic {}", encoded));
        let (user, pass) = basic_credentials(&headers).unwrap();
        assert_eq!(user, "scraper");
        assert_eq!(pass, "pa:ss");
    }

    #[test]
    fn test_basic_credentials_rejects_other_schemes() {
        assert!(basic_credentials(&headers_with("Bearer abc")).is_none());
        assert!(basic_credentials(&headers_with("Basic !!!")).is_none());
        assert!(basic_credentials(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_credentials_match() {
        let expected = BasicAuthCredentials::new("scraper", "hunter2");
        let good = headers_with(&format!("Basic {}", STANDARD.encode("scraper:hunter2")));
        let bad = headers_with(&format!("Basic {}", STANDARD.encode("scraper:hunter3")));
        let short = headers_with(&format!("Basic {}", STANDARD.encode("scraper:hunt")));
        assert!(credentials_match(&good, &expected));
        assert!(!credentials_match(&bad, &expected));
        assert!(!credentials_match(&short, &expected));
    }
}
