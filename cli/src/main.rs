//! CLI entrypoint for linodemcp
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod logging;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use linodemcp_application::{CheckHealthUseCase, Clock, ConfigReader, SystemClock};
use linodemcp_infrastructure::{
    AccountListTool, BrokerMetrics, BuildInfo, ConfigLoader, ConfigManager, Dispatcher,
    DispatcherConfig, EnvOverrides, HealthCheckTool, HelloTool, MetricsProbe, MetricsServer,
    SidecarConfig, ToolRegistry, VersionTool,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("linodemcp: {:#}", e);
            1
        }
    };
    // The stdin reader thread cannot be interrupted; do not wait for it.
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    // === Configuration ===
    let path = match cli.config {
        Some(path) => path,
        None => ConfigLoader::default_path().context("cannot determine the user config directory")?,
    };
    let manager = Arc::new(
        ConfigManager::load_or_create(&path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
    );
    let env = EnvOverrides::from_env().context("reading environment overrides")?;
    let mut settings = manager.snapshot().system;
    env.apply(&mut settings).context("applying environment overrides")?;
    let daemon = cli.daemon || env.daemon_mode();

    let _log_guard = logging::init(&settings)?;
    info!(
        config = %manager.path().display(),
        server = %settings.server_name,
        version = env!("CARGO_PKG_VERSION"),
        daemon,
        ?env,
        "Starting linodemcp"
    );
    if !settings.log_file.is_empty() {
        info!(
            log_file = %settings.log_file,
            max_backups = settings.log_max_backups,
            max_size_mb = settings.log_max_size,
            max_age_days = settings.log_max_age,
            "File logging enabled (daily rotation)"
        );
    }

    // === Dependency Injection ===
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let metrics = Arc::new(BrokerMetrics::new().context("registering metrics")?);
    let health = Arc::new(
        CheckHealthUseCase::new(Arc::clone(&clock)).with_probe(Arc::new(MetricsProbe::new(
            Arc::clone(&metrics),
            settings.enable_metrics,
        ))),
    );

    let registry = Arc::new(ToolRegistry::new());
    let config_reader: Arc<dyn ConfigReader> = manager.clone();
    registry.register(Arc::new(HelloTool::new(settings.server_name.clone())))?;
    registry.register(Arc::new(VersionTool::new(BuildInfo::current(settings.server_name.clone()))))?;
    registry.register(Arc::new(HealthCheckTool::new(Arc::clone(&health))))?;
    registry.register(Arc::new(AccountListTool::new(config_reader)))?;
    info!(tools = ?registry.names(), "Tools registered");

    let cancel = CancellationToken::new();
    tokio::spawn(signals::watch(cancel.clone()));

    // === Sidecar ===
    let sidecar = if settings.enable_metrics || daemon {
        let config = SidecarConfig::from_settings(&settings, &env)?;
        let server = MetricsServer::new(config, Arc::clone(&metrics), Arc::clone(&health), clock);
        server.start().await.context("starting metrics sidecar")?;
        Some(server)
    } else {
        None
    };

    // === Serve ===
    if daemon {
        info!("Daemon mode: serving the HTTP sidecar only");
        cancel.cancelled().await;
    } else {
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&metrics),
            DispatcherConfig {
                server_name: settings.server_name.clone(),
                ..DispatcherConfig::default()
            },
        );
        let served = dispatcher.serve_stdio(cancel.clone()).await;
        cancel.cancel();
        if let Err(e) = served {
            warn!(error = %e, "Dispatcher stopped with an error");
        }
    }

    if let Some(server) = sidecar
        && let Err(e) = server.stop().await
    {
        warn!(error = %e, "Metrics sidecar shutdown incomplete");
    }

    info!("Shutdown complete");
    Ok(())
}
