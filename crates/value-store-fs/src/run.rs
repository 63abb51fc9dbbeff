//! One evaluation run of a check against its persisted value store.

use chrono::Utc;
use tracing::debug;
use value_store::ValueStore;

use crate::Result;
use crate::repository::StateRepository;
use crate::scope::StoreScope;

/// Current wall-clock time as fractional seconds since the epoch.
pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Loads a store at the start of a run and writes it back on [`commit`].
///
/// The time of the run is sampled once, so every counter of the check is
/// evaluated against the same `now`. A run dropped without committing leaves
/// the persisted store exactly as it was.
///
/// [`commit`]: EvaluationRun::commit
#[derive(Debug)]
pub struct EvaluationRun<'r> {
    repository: &'r StateRepository,
    scope: StoreScope,
    store: ValueStore,
    now: f64,
}

impl<'r> EvaluationRun<'r> {
    pub fn begin(repository: &'r StateRepository, scope: StoreScope) -> Result<Self> {
        Self::begin_at(repository, scope, now_timestamp())
    }

    /// Start a run at an explicit time, e.g. the time the agent data was
    /// collected.
    pub fn begin_at(repository: &'r StateRepository, scope: StoreScope, now: f64) -> Result<Self> {
        if !now.is_finite() {
            return Err(value_store::Error::invalid_argument(format!(
                "run time for {scope} must be finite, got {now}"
            ))
            .into());
        }
        let store = repository.load(&scope)?;
        debug!(scope = %scope, entries = store.len(), now, "Evaluation run started");
        Ok(Self {
            repository,
            scope,
            store,
            now,
        })
    }

    pub fn scope(&self) -> &StoreScope {
        &self.scope
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Lend the store to a check function for this run.
    pub fn store(&mut self) -> &mut ValueStore {
        &mut self.store
    }

    /// Persist the store. Returns whether anything was written.
    pub fn commit(mut self) -> Result<bool> {
        self.repository.persist(&self.scope, &mut self.store)
    }
}
