use chrono::{TimeZone, Utc};
use scriptgate::security::{
    AccessGate, AttemptLedger, GatePolicy, GateReason, JsonFileLedgerStore, LedgerStore,
    ManualClock,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ))
}

#[test]
fn corrupt_ledger_is_treated_as_empty_history() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("access_ledger.json");
    fs::write(&path, "{ not json").unwrap();

    let ledger = Arc::new(AttemptLedger::new(
        Arc::new(JsonFileLedgerStore::new(&path)),
        clock(),
    ));
    let gate = AccessGate::new("secret", GatePolicy::default(), ledger);

    let decision = gate.verify("wrong").unwrap();
    assert_eq!(decision.reason, GateReason::WrongSecret);
    assert_eq!(decision.attempts_remaining, 4);

    let repaired = JsonFileLedgerStore::new(&path).load().unwrap().unwrap();
    assert_eq!(repaired.failure_count(), 1);
}

#[test]
fn older_and_newer_ledger_files_stay_readable() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("access_ledger.json");
    fs::write(
        &path,
        r#"{
            "failures": ["2026-03-01T11:59:00Z"],
            "schema_version": 9,
            "notes": "written by a newer build"
        }"#,
    )
    .unwrap();

    let ledger = JsonFileLedgerStore::new(&path).load().unwrap().unwrap();
    assert_eq!(ledger.failure_count(), 1);
    assert!(ledger.successes.is_empty());
    assert_eq!(ledger.total_generations, 0);
}

#[test]
fn failed_save_never_grants_access() {
    let tmp = TempDir::new().unwrap();
    // A directory where the ledger file should be makes every save fail.
    let path = tmp.path().join("ledger-dir");
    fs::create_dir(&path).unwrap();
    fs::create_dir(path.with_extension("tmp")).unwrap();

    let ledger = Arc::new(AttemptLedger::new(
        Arc::new(JsonFileLedgerStore::new(&path)),
        clock(),
    ));
    let gate = AccessGate::new("secret", GatePolicy::default(), ledger);

    assert!(gate.verify("secret").is_err());
    assert!(gate.verify("wrong").is_err());
}

#[test]
fn ledger_file_survives_a_restart() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("access_ledger.json");
    let clock = clock();

    {
        let ledger = Arc::new(AttemptLedger::new(
            Arc::new(JsonFileLedgerStore::new(&path)),
            clock.clone(),
        ));
        let gate = AccessGate::new("secret", GatePolicy::new(2, 15), ledger);
        gate.verify("a").unwrap();
        gate.verify("b").unwrap();
    }

    let ledger = Arc::new(AttemptLedger::new(
        Arc::new(JsonFileLedgerStore::new(&path)),
        clock,
    ));
    let gate = AccessGate::new("secret", GatePolicy::new(2, 15), ledger);
    let decision = gate.verify("secret").unwrap();
    assert_eq!(decision.reason, GateReason::LockedOut);
    assert_eq!(decision.retry_after_secs, Some(900));
}
