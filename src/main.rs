//! Single-target HTTP forwarder.
//!
//! ```text
//!     Client ──▶ listener ──▶ axum catch-all ──▶ hyper client ──▶ Upstream
//!     Client ◀── response passthrough (streamed) ◀──────────────────┘
//!                      └── on failure: 500 "Proxy error: <reason>"
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_forwarder::config::{read_or_default, validate_config, ConfigError, UpstreamConfig};
use http_forwarder::lifecycle::{self, signals, Shutdown};
use http_forwarder::observability::logging;

#[derive(Parser)]
#[command(name = "forwarder")]
#[command(about = "Relay every HTTP request to one fixed upstream", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (missing file = defaults).
    #[arg(short, long, default_value = "forwarder.toml")]
    config: PathBuf,

    /// Port to listen on, overriding `listener.port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Upstream URL such as `http://127.0.0.1:8000`, overriding `[upstream]`.
    #[arg(short, long)]
    upstream: Option<String>,

    /// Log level, overriding `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = read_or_default(&cli.config)?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(raw) = cli.upstream.as_deref() {
        config.upstream = UpstreamConfig::from_url(raw)?;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        config_path = %cli.config.display(),
        config_file_found = cli.config.exists(),
        "forwarder v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    if let Err(e) = lifecycle::start(config, server_shutdown).await {
        tracing::error!(error = %e, "Startup failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
