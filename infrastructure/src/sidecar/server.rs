//! Sidecar lifecycle
//!
//! ```text
//! new ──► start ──► (serving) ──► stop
//!           │                       │
//!           └─ AlreadyRunning       └─ NotRunning / ShutdownTimeout
//! ```
//!
//! `start` binds synchronously so bind and TLS errors surface to the caller,
//! then serves on a spawned task. `stop` drains connections for up to the
//! configured shutdown timeout before closing them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use axum_server::Handle;
use linodemcp_application::{CheckHealthUseCase, Clock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::config::SidecarConfig;
use super::error::SidecarError;
use super::handlers;
use super::middleware::{basic_auth, catch_panic, rate_limit, security_headers};
use super::state::SidecarState;
use super::tls;
use crate::metrics::BrokerMetrics;

/// Extra time allowed for the serve task to exit after connections are closed.
const EXIT_GRACE: Duration = Duration::from_secs(1);

struct Running {
    addr: SocketAddr,
    handle: Handle<SocketAddr>,
    task: JoinHandle<std::io::Result<()>>,
}

pub struct MetricsServer {
    config: SidecarConfig,
    state: Arc<SidecarState>,
    running: Mutex<Option<Running>>,
}

impl MetricsServer {
    pub fn new(
        config: SidecarConfig,
        metrics: Arc<BrokerMetrics>,
        deep_health: Arc<CheckHealthUseCase>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = Arc::new(SidecarState::new(&config, metrics, deep_health, clock));
        Self {
            config,
            state,
            running: Mutex::new(None),
        }
    }

    /// The full application: routes plus the middleware chain.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Bind and start serving. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, SidecarError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(SidecarError::AlreadyRunning);
        }

        let tls = match &self.config.tls {
            Some(files) => Some(tls::rustls_config(files)?),
            None => None,
        };

        let requested = SocketAddr::new(self.config.host, self.config.port);
        let bind_failed = |source| SidecarError::BindFailed {
            addr: requested,
            source,
        };
        let listener = std::net::TcpListener::bind(requested).map_err(bind_failed)?;
        listener.set_nonblocking(true).map_err(bind_failed)?;
        let addr = listener.local_addr().map_err(bind_failed)?;

        let handle = Handle::new();
        let app = self.router().into_make_service();
        let task = match tls {
            Some(tls) => {
                let server = axum_server::from_tcp_rustls(listener, tls)
                    .map_err(bind_failed)?
                    .handle(handle.clone());
                tokio::spawn(server.serve(app))
            }
            None => {
                let server = axum_server::from_tcp(listener)
                    .map_err(bind_failed)?
                    .handle(handle.clone());
                tokio::spawn(server.serve(app))
            }
        };

        info!(
            addr = %addr,
            tls = self.config.tls_enabled(),
            auth = self.config.basic_auth.is_some(),
            metrics_enabled = self.config.metrics_enabled,
            "Metrics sidecar listening"
        );
        *running = Some(Running { addr, handle, task });
        Ok(addr)
    }

    /// Port actually bound, once started.
    pub async fn port(&self) -> Option<u16> {
        self.running.lock().await.as_ref().map(|r| r.addr.port())
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Graceful shutdown bounded by the configured timeout.
    pub async fn stop(&self) -> Result<(), SidecarError> {
        let Some(mut running) = self.running.lock().await.take() else {
            return Err(SidecarError::NotRunning);
        };

        let timeout = self.config.shutdown_timeout;
        info!(
            connections = running.handle.connection_count(),
            "Stopping metrics sidecar"
        );
        running.handle.graceful_shutdown(Some(timeout));

        match tokio::time::timeout(timeout + EXIT_GRACE, &mut running.task).await {
            Ok(Ok(Ok(()))) => {
                info!("Metrics sidecar stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Metrics sidecar exited with an error");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Metrics sidecar task failed");
                Ok(())
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Metrics sidecar did not stop in time, closing");
                running.handle.shutdown();
                running.task.abort();
                Err(SidecarError::ShutdownTimeout(timeout))
            }
        }
    }
}

/// Routes wrapped so that the security headers layer is outermost and the
/// panic guard sits directly around the handlers.
pub fn build_router(state: Arc<SidecarState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/provider/health", get(handlers::provider_health))
        .with_state(Arc::clone(&state))
        .layer(middleware::from_fn(catch_panic))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), basic_auth))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), rate_limit))
        .layer(middleware::from_fn_with_state(state, security_headers))
}
