//! Persisted attempt ledger.
//!
//! The ledger is the only cross-request mutable state in the relay: every
//! verification attempt and every completed generation goes through
//! [`AttemptLedger::update`], which runs load → mutate → save under one
//! in-process lock so concurrent callers never overwrite each other's
//! appends.

use super::clock::Clock;
use crate::error::PersistenceError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Attempt history plus the generation total.
///
/// Every field defaults when absent and unknown fields are ignored, so older
/// or newer ledger files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default = "Utc::now")]
    pub first_seen: DateTime<Utc>,
    /// Appended in observation order; not guaranteed sorted under clock skew.
    #[serde(default)]
    pub successes: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub failures: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub total_generations: u64,
}

impl Ledger {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            first_seen: now,
            successes: Vec::new(),
            failures: Vec::new(),
            total_generations: 0,
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Most recently appended failure (not the maximum timestamp).
    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        self.failures.last().copied()
    }
}

/// Storage backend for the ledger. Implementations persist the full record
/// on every save; last writer wins.
pub trait LedgerStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Ledger>>;

    fn save(&self, ledger: &Ledger) -> Result<()>;

    /// Human-readable location, used in logs and CLI output.
    fn location(&self) -> String;
}

/// Pretty-printed JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading ledger: {}", self.path.display()))?;
        let ledger: Ledger = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing ledger: {}", self.path.display()))?;
        Ok(Some(ledger))
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        let json = serde_json::to_string_pretty(ledger).context("failed serializing ledger")?;
        write_atomic(&self.path, &json)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    slot: Mutex<Option<Ledger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            slot: Mutex::new(Some(ledger)),
        }
    }

    pub fn snapshot(&self) -> Option<Ledger> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Option<Ledger>> {
        Ok(self.snapshot())
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(ledger.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Serialized access to a [`LedgerStore`].
pub struct AttemptLedger {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl AttemptLedger {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Current ledger. Missing, unreadable, or corrupt state yields a fresh
    /// ledger stamped with the current time.
    pub fn load(&self) -> Ledger {
        match self.store.load() {
            Ok(Some(ledger)) => ledger,
            Ok(None) => Ledger::fresh(self.clock.now()),
            Err(error) => {
                tracing::warn!(
                    location = %self.store.location(),
                    error = %format!("{error:#}"),
                    "ledger unreadable, starting from empty history"
                );
                Ledger::fresh(self.clock.now())
            }
        }
    }

    pub fn save(&self, ledger: &Ledger) -> Result<(), PersistenceError> {
        self.store.save(ledger).map_err(PersistenceError::Save)
    }

    /// Run one load → mutate → save cycle under the ledger lock.
    ///
    /// The closure receives the ledger and the instant the critical section
    /// started. The ledger is written back only when the closure changed it;
    /// a failed write is returned to the caller.
    pub fn update<T>(
        &self,
        mutate: impl FnOnce(&mut Ledger, DateTime<Utc>) -> T,
    ) -> Result<T, PersistenceError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut ledger = self.load();
        let before = ledger.clone();
        let out = mutate(&mut ledger, self.clock.now());
        if ledger != before {
            self.save(&ledger)?;
        }
        Ok(out)
    }

    /// Replace the persisted ledger with an empty one.
    pub fn reset(&self) -> Result<Ledger, PersistenceError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let ledger = Ledger::fresh(self.clock.now());
        self.save(&ledger)?;
        Ok(ledger)
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating ledger parent: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("failed writing ledger temp file: {}", temp_path.display()))?;

    if let Err(rename_error) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(rename_error).with_context(|| {
            format!("failed replacing ledger file atomically: {}", path.display())
        });
    }

    Ok(())
}
