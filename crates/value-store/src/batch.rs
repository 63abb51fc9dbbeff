//! Rates for many counters of one check in a single pass.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::rate::{OnOverflow, get_rate};
use crate::store::ValueStore;

/// Rates computed by [`collect_rates`], with the per-key failures kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateReport {
    pub rates: BTreeMap<String, f64>,
    pub errors: Vec<(String, Error)>,
}

impl RateReport {
    pub fn rate(&self, key: &str) -> Option<f64> {
        self.rates.get(key).copied()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Compute the rate of every counter in `counters` at the same time `now`.
///
/// Counters reported as `None` (not present in this run's data) are skipped
/// and their stored baseline is kept. A failing key is recorded in
/// [`RateReport::errors`] and never prevents the remaining keys from being
/// evaluated.
pub fn collect_rates<K, I>(
    store: &mut ValueStore,
    now: f64,
    counters: I,
    on_overflow: OnOverflow,
) -> RateReport
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Option<f64>)>,
{
    let mut report = RateReport::default();
    for (key, counter) in counters {
        let Some(value) = counter else {
            continue;
        };
        let key = key.as_ref();
        match get_rate(store, key, now, value, on_overflow) {
            Ok(rate) => {
                report.rates.insert(key.to_string(), rate);
            }
            Err(e) => report.errors.push((key.to_string(), e)),
        }
    }
    report
}
