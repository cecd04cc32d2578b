//! Ramp Admin Daemon
//!
//! Opens the data directory, creates missing storage files and runs until
//! interrupted.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p rampd
//!
//! # Start with a custom data directory
//! RAMP_DATA_DIR=/var/lib/ramp RAMP_LOG_JSON=true cargo run -p rampd
//! ```
//!
//! # Environment Variables
//!
//! - `RAMP_ENV`: Environment (test, development, production)
//! - `RAMP_DATA_DIR`: Data directory (fallback `STORAGE_DIR`, default: ./data)
//! - `RAMP_STORAGE_TIMEOUT_MS`: Per-operation storage timeout (default: 5000)
//! - `RAMP_LOG_JSON`: Emit JSON logs (default: false)

use rampd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("rampd=info".parse()?)
        .add_directive("ramp_store=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        data_dir = %config.storage.data_dir.display(),
        timeout_ms = config.storage.timeout.as_millis() as u64,
        "Ramp Admin Daemon"
    );

    let daemon = Daemon::bootstrap(config).await?;
    daemon.run().await?;

    Ok(())
}
