//! # Value Store
//!
//! Per-check state carried between monitoring runs. Check functions are
//! stateless; to report the rate of a counter or a moving average they need
//! the sample recorded in the previous run. This crate provides the store
//! holding those samples and the computations on top of it.
//!
//! ## Features
//!
//! - [`ValueStore`], lent to a check as `&mut ValueStore` for one evaluation
//! - [`get_rate`] with an explicit [`OnOverflow`] policy for wrapped counters
//!   and non-advancing clocks
//! - [`get_average`], a time-weighted exponential moving average
//! - [`collect_rates`] and [`get_rate_with_average`] for checks with many
//!   counters
//!
//! Persistence lives in the `value-store-fs` crate.
//!
//! ## License
//!
//! MIT License
//!
//! ## Authors
//!
//! - hua0512
//!

mod average;
mod batch;
mod error;
mod rate;
mod store;
#[cfg(test)]
mod test_utils;

pub use average::{Average, RateWithAverage, get_average, get_rate_with_average};
pub use batch::{RateReport, collect_rates};
pub use error::{Error, GetRateError, Result};
pub use rate::{OnOverflow, RateOutcome, get_rate, update_rate};
pub use store::{ValueStore, ValueStoreEntry};
