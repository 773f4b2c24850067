pub mod clock;
pub mod gate;
pub mod ledger;
pub mod usage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{
    AccessGate, DEFAULT_LOCKOUT_MINUTES, DEFAULT_MAX_ATTEMPTS, GateDecision, GatePolicy,
    GateReason, constant_time_eq,
};
pub use ledger::{AttemptLedger, JsonFileLedgerStore, Ledger, LedgerStore, MemoryLedgerStore};
pub use usage::UsageCounter;
