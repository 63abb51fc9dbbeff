//! # Value Store FS
//!
//! Persistence for [`value_store::ValueStore`]: one JSON file per
//! (monitored object, check, item), replaced atomically at the end of every
//! evaluation run.
//!
//! ```no_run
//! use value_store::{OnOverflow, get_rate};
//! use value_store_fs::{EvaluationRun, StateConfig, StateRepository, StoreScope};
//!
//! # fn main() -> value_store_fs::Result<()> {
//! let repository = StateRepository::new(StateConfig::load(None)?);
//! let mut run = EvaluationRun::begin(&repository, StoreScope::for_check("host01", "kernel")?)?;
//! let now = run.now();
//! let rate = get_rate(run.store(), "ctxt", now, 123_456.0, OnOverflow::Zero)?;
//! run.commit()?;
//! # let _ = rate;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod fs;
pub mod logging;
mod repository;
mod run;
mod scope;

pub use config::StateConfig;
pub use error::{Error, Result};
pub use repository::StateRepository;
pub use run::{EvaluationRun, now_timestamp};
pub use scope::StoreScope;
