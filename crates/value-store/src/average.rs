//! Time-weighted moving averages over a configurable backlog window.

use tracing::debug;

use crate::error::{Error, Result, ensure_finite, ensure_key};
use crate::rate::{OnOverflow, RateOutcome, update_rate};
use crate::store::{ValueStore, ValueStoreEntry};

/// Update the exponential moving average stored under `key` with `sample`.
///
/// A sample taken `backlog_minutes` ago still carries weight `1/e`, one taken
/// several windows ago is negligible, so the result behaves like a sliding
/// window average without keeping the history. The first sample for a key is
/// its own average. If no time elapsed since the previous sample, the
/// previous average is returned unchanged. The stored average is always
/// finite, saturating at the limits of `f64`.
pub fn get_average(
    store: &mut ValueStore,
    key: &str,
    now: f64,
    sample: f64,
    backlog_minutes: f64,
) -> Result<f64> {
    ensure_key(key)?;
    ensure_finite("time", key, now)?;
    ensure_finite("sample", key, sample)?;
    if !backlog_minutes.is_finite() || backlog_minutes <= 0.0 {
        return Err(Error::invalid_argument(format!(
            "backlog for '{key}' must be a positive number of minutes, got {backlog_minutes}"
        )));
    }

    let average = match store.average_sample(key) {
        None => {
            debug!(key = %key, now, sample, "Average initialized");
            sample
        }
        Some((prev_time, prev_average)) => {
            let delta_t = now - prev_time;
            if delta_t <= 0.0 {
                prev_average
            } else {
                let weight = 1.0 - (-delta_t / (backlog_minutes * 60.0)).exp();
                // convex form: no `sample - prev_average` that could overflow
                let blended = prev_average * (1.0 - weight) + weight * sample;
                blended.clamp(f64::MIN, f64::MAX)
            }
        }
    };

    store.insert(key, ValueStoreEntry::average(now, average));
    Ok(average)
}

/// An averaged value together with the window it was averaged over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average {
    pub value: f64,
    pub backlog_minutes: f64,
}

impl Average {
    /// Sum two averages taken over the same window.
    pub fn checked_add(self, other: Average) -> Result<Average> {
        if self.backlog_minutes != other.backlog_minutes {
            return Err(Error::invalid_argument(format!(
                "cannot add averages with different backlogs ({} and {} minutes)",
                self.backlog_minutes, other.backlog_minutes
            )));
        }
        Ok(Average {
            value: self.value + other.value,
            backlog_minutes: self.backlog_minutes,
        })
    }
}

/// A rate and, when averaging is configured, its moving average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateWithAverage {
    pub rate: f64,
    pub average: Option<Average>,
}

impl RateWithAverage {
    /// Combine two rates, e.g. the members of a bonded interface.
    ///
    /// The average survives only if both sides carry one.
    pub fn checked_add(self, other: RateWithAverage) -> Result<RateWithAverage> {
        let average = match (self.average, other.average) {
            (Some(a), Some(b)) => Some(a.checked_add(b)?),
            _ => None,
        };
        Ok(RateWithAverage {
            rate: self.rate + other.rate,
            average,
        })
    }
}

/// Compute the rate of a counter and optionally average it.
///
/// The counter sample lives under `key`, the average under `average_key`.
/// Returns `None` on the first sample, when no rate is known yet. Only a
/// genuine rate feeds the average: a sample rebased under
/// [`OnOverflow::Zero`] reports a zero rate and leaves the average alone.
pub fn get_rate_with_average(
    store: &mut ValueStore,
    key: &str,
    average_key: &str,
    now: f64,
    value: f64,
    on_overflow: OnOverflow,
    backlog_minutes: Option<f64>,
) -> Result<Option<RateWithAverage>> {
    let rate = match update_rate(store, key, now, value)? {
        RateOutcome::Initialized => return Ok(None),
        RateOutcome::Rebased(err) => match on_overflow {
            OnOverflow::Raise => return Err(err.into()),
            OnOverflow::Zero => {
                return Ok(Some(RateWithAverage {
                    rate: 0.0,
                    average: None,
                }));
            }
        },
        RateOutcome::Rate(rate) => rate,
    };

    let average = backlog_minutes
        .map(|backlog_minutes| {
            get_average(store, average_key, now, rate, backlog_minutes).map(|value| Average {
                value,
                backlog_minutes,
            })
        })
        .transpose()?;

    Ok(Some(RateWithAverage { rate, average }))
}
