use super::ledger::AttemptLedger;
use crate::error::PersistenceError;
use std::sync::Arc;

/// Persists the total number of completed generations in the ledger.
pub struct UsageCounter {
    ledger: Arc<AttemptLedger>,
}

impl UsageCounter {
    pub fn new(ledger: Arc<AttemptLedger>) -> Self {
        Self { ledger }
    }

    /// Add one completed generation; returns the new total.
    pub fn increment(&self) -> Result<u64, PersistenceError> {
        self.ledger.update(|ledger, _| {
            ledger.total_generations = ledger.total_generations.saturating_add(1);
            ledger.total_generations
        })
    }

    pub fn total(&self) -> u64 {
        self.ledger.load().total_generations
    }
}
