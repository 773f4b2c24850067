use crate::config::Config;
use crate::security::{AttemptLedger, GatePolicy, JsonFileLedgerStore, Ledger, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Ledger handle for operator commands, backed by the configured file.
pub fn open_ledger(config: &Config) -> AttemptLedger {
    AttemptLedger::new(
        Arc::new(JsonFileLedgerStore::new(config.ledger_path())),
        Arc::new(SystemClock),
    )
}

fn stamp(ts: Option<&DateTime<Utc>>) -> String {
    ts.map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

pub fn render_ledger(ledger: &Ledger, policy: GatePolicy, now: DateTime<Utc>) -> String {
    let lock = match policy.lockout_remaining(ledger, now) {
        Some(secs) => format!("locked ({secs}s remaining)"),
        None => "open".to_string(),
    };
    [
        format!("First seen         {}", stamp(Some(&ledger.first_seen))),
        format!(
            "Successes          {} (last: {})",
            ledger.successes.len(),
            stamp(ledger.successes.last())
        ),
        format!(
            "Failures           {} (last: {})",
            ledger.failure_count(),
            stamp(ledger.failures.last())
        ),
        format!("Total generations  {}", ledger.total_generations),
        format!("Gate               {lock}"),
    ]
    .join("\n")
}

pub fn show(config: &Config) -> String {
    let ledger = open_ledger(config);
    let snapshot = ledger.load();
    format!(
        "Ledger             {}\n{}",
        ledger.location(),
        render_ledger(&snapshot, config.gate.policy(), ledger.clock().now())
    )
}
