//! Tracing setup for processes that run checks against value stores.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "value_store=info,value_store_fs=info";

/// Install a global subscriber with an env-driven filter.
///
/// `RUST_LOG` takes precedence, then `filter`, then [`DEFAULT_LOG_FILTER`].
/// Returns `Ok(false)` if a subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> Result<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(filter.unwrap_or(DEFAULT_LOG_FILTER))
            .map_err(|e| Error::config(format!("Invalid filter directive: {e}")))?,
    };

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok())
}
