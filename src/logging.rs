//! Logging setup.
//!
//! Structured logging via the `tracing` crate. The level comes from
//! `CAPSTAN_LOG` when set, otherwise from the CLI flag, defaulting to `info`.

use crate::error::OrchestratorError;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CAPSTAN_LOG";

pub fn init_logging(level: Option<&str>) -> Result<(), OrchestratorError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(level.unwrap_or("info")))
        .map_err(|e| OrchestratorError::InvalidInput(format!("invalid log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| OrchestratorError::InvalidInput(format!("failed to init logging: {e}")))
}
