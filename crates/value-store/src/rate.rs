//! Counter rates computed between two monitoring runs.

use tracing::debug;

use crate::error::{GetRateError, Result, ensure_finite, ensure_key};
use crate::store::{ValueStore, ValueStoreEntry};

/// What to do when a counter cannot produce a rate because it decreased,
/// because the clock did not advance, or because the rate overflows.
///
/// Some counters (cumulative error counts) must never show a spurious rate,
/// others are expected to reset now and then. The choice belongs to each
/// call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOverflow {
    /// Report the anomaly as a [`GetRateError`].
    Raise,
    /// Absorb the anomaly and report a rate of `0.0` for this run.
    Zero,
}

/// Classification of a counter sample, before any overflow policy applies.
#[derive(Debug, Clone, PartialEq)]
pub enum RateOutcome {
    /// Increase per second since the previous sample.
    Rate(f64),
    /// First sample for this key; no rate is knowable yet.
    Initialized,
    /// The sample became the new baseline without yielding a rate.
    Rebased(GetRateError),
}

impl RateOutcome {
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::Rate(rate) => Some(*rate),
            Self::Initialized | Self::Rebased(_) => None,
        }
    }
}

/// Record a counter sample and classify it against the previous one.
///
/// The stored sample for `key` is always replaced by `(now, value)`, so the
/// next call has the freshest baseline whatever the outcome.
pub fn update_rate(store: &mut ValueStore, key: &str, now: f64, value: f64) -> Result<RateOutcome> {
    ensure_key(key)?;
    ensure_finite("time", key, now)?;
    ensure_finite("counter value", key, value)?;

    let previous = store.counter_sample(key);
    store.insert(key, ValueStoreEntry::counter(now, value));

    let Some((prev_time, prev_value)) = previous else {
        debug!(key = %key, now, value, "Counter initialized");
        return Ok(RateOutcome::Initialized);
    };

    let delta_t = now - prev_time;
    if delta_t <= 0.0 {
        return Ok(RateOutcome::Rebased(GetRateError::NoTimeElapsed {
            key: key.to_string(),
            previous: prev_time,
            now,
        }));
    }

    if value < prev_value {
        return Ok(RateOutcome::Rebased(GetRateError::CounterWrapped {
            key: key.to_string(),
            previous: prev_value,
            current: value,
        }));
    }

    // finite samples far apart in magnitude can still overflow
    let rate = (value - prev_value) / delta_t;
    if !rate.is_finite() {
        return Ok(RateOutcome::Rebased(GetRateError::RateOverflow {
            key: key.to_string(),
            previous: prev_value,
            current: value,
            elapsed: delta_t,
        }));
    }

    Ok(RateOutcome::Rate(rate))
}

/// Compute the per-second rate of a monotonically increasing counter.
///
/// Returns `0.0` on the first sample for `key`. A decreased counter, a
/// non-advancing clock or a rate too large for `f64` fails with
/// [`GetRateError`] under [`OnOverflow::Raise`] and yields `0.0` under
/// [`OnOverflow::Zero`]; in every case the new sample is already stored as
/// the next baseline.
pub fn get_rate(
    store: &mut ValueStore,
    key: &str,
    now: f64,
    value: f64,
    on_overflow: OnOverflow,
) -> Result<f64> {
    match update_rate(store, key, now, value)? {
        RateOutcome::Rate(rate) => Ok(rate),
        RateOutcome::Initialized => Ok(0.0),
        RateOutcome::Rebased(err) => match on_overflow {
            OnOverflow::Raise => Err(err.into()),
            OnOverflow::Zero => {
                debug!(key = %key, error = %err, "Counter rebased, reporting zero rate");
                Ok(0.0)
            }
        },
    }
}
