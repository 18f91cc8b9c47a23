use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use betacrew_client::config::{self, Args, ResolvedConfig};
use betacrew_client::{logging, output, ConfigError, RecoveryEngine};

fn resolve_config() -> Result<ResolvedConfig, ConfigError> {
    config::load_env()?;
    Args::parse().into_config()
}

fn main() -> Result<()> {
    let ResolvedConfig { config, warnings } = match resolve_config() {
        Ok(resolved) => resolved,
        Err(e) => {
            // still leave a fresh log describing why the run never started
            let log_path = config::fallback_log_path();
            if logging::init(&log_path).is_ok() {
                error!(error = %e, "configuration error");
            }
            return Err(e).context("resolve configuration");
        }
    };

    logging::init(&config.log_path)
        .with_context(|| format!("initialize logging at {}", config.log_path.display()))?;
    for warning in &warnings {
        warn!("{}", warning);
    }
    info!(host = %config.host, port = config.port, "client initiated");

    let mut engine = RecoveryEngine::new(config.clone());
    let packets = engine.run()?;
    info!(count = packets.len(), "process completed");

    if let Err(e) = output::write_json(&config.output_path, &packets) {
        error!(error = %e, "failed to write output");
        return Err(e).context("write JSON output");
    }
    Ok(())
}
