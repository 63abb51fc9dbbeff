//! Error types for rate and average computation.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A counter sample that cannot produce a meaningful rate.
///
/// The offending sample has already become the new baseline when this is
/// returned, so the next call for the same key starts from sane state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GetRateError {
    #[error("Counter '{key}' wrapped: value dropped from {previous} to {current}")]
    CounterWrapped {
        key: String,
        previous: f64,
        current: f64,
    },

    #[error("No time elapsed for counter '{key}': last sample at {previous}, now {now}")]
    NoTimeElapsed { key: String, previous: f64, now: f64 },

    #[error("Rate of counter '{key}' overflows: {previous} to {current} in {elapsed}s")]
    RateOverflow {
        key: String,
        previous: f64,
        current: f64,
        elapsed: f64,
    },
}

impl GetRateError {
    /// The value store key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            Self::CounterWrapped { key, .. }
            | Self::NoTimeElapsed { key, .. }
            | Self::RateOverflow { key, .. } => key,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    GetRate(#[from] GetRateError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns the rate error if this is one.
    pub fn as_get_rate(&self) -> Option<&GetRateError> {
        match self {
            Self::GetRate(e) => Some(e),
            Self::InvalidArgument(_) => None,
        }
    }
}

pub(crate) fn ensure_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_argument("value store key must not be empty"));
    }
    Ok(())
}

pub(crate) fn ensure_finite(name: &'static str, key: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::invalid_argument(format!(
            "{name} for '{key}' must be finite, got {value}"
        )));
    }
    Ok(())
}
