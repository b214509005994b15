//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for linodemcp
#[derive(Parser, Debug)]
#[command(name = "linodemcp")]
#[command(author, version, about = "Tool-call broker for Linode over stdio JSON-RPC")]
#[command(long_about = r#"
linodemcp is launched by a tool-calling client as a subprocess. It reads
JSON-RPC 2.0 requests on standard input, one per line, and writes responses
on standard output. Logs go to standard error as JSON.

An HTTP sidecar serves /metrics, /health and /provider/health when metrics
are enabled or in daemon mode.

Configuration is read from (first match wins):
1. --config <path>
2. <user config dir>/linodemcp/config.toml (created with defaults if absent)

Environment overrides: SERVER_NAME, LOG_LEVEL, ENABLE_METRICS, METRICS_PORT,
METRICS_AUTH_USERNAME, METRICS_AUTH_PASSWORD, METRICS_TLS_ENABLED,
METRICS_TLS_CERT_FILE, METRICS_TLS_KEY_FILE, DAEMON_MODE.
"#)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Serve only the HTTP sidecar; do not read standard input
    #[arg(long)]
    pub daemon: bool,
}
