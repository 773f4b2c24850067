//! Access gate: one static secret, a failure budget, and a lockout window
//! measured from the most recent failure.

use super::ledger::{AttemptLedger, Ledger};
use crate::error::PersistenceError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateReason {
    Ok,
    WrongSecret,
    LockedOut,
}

/// Outcome of a single verification. Produced fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub reason: GateReason,
    pub attempts_remaining: u32,
    pub message: String,
    /// Seconds until the lockout window after the last failure closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl GateDecision {
    pub fn granted(max_attempts: u32) -> Self {
        Self {
            allowed: true,
            reason: GateReason::Ok,
            attempts_remaining: max_attempts,
            message: "Access granted.".to_string(),
            retry_after_secs: None,
        }
    }

    pub fn wrong_secret(attempts_remaining: u32) -> Self {
        Self {
            allowed: false,
            reason: GateReason::WrongSecret,
            attempts_remaining,
            message: format!("Wrong secret. Attempts remaining: {attempts_remaining}"),
            retry_after_secs: None,
        }
    }

    pub fn locked_out(retry_after_secs: Option<u64>) -> Self {
        let message = match retry_after_secs {
            Some(secs) => format!("Too many failed attempts. Try again in {secs}s."),
            None => "Too many failed attempts. Access is locked.".to_string(),
        };
        Self {
            allowed: false,
            reason: GateReason::LockedOut,
            attempts_remaining: 0,
            message,
            retry_after_secs,
        }
    }
}

/// Failure budget and lockout window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    pub max_attempts: u32,
    pub lockout_window: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_window: Duration::minutes(i64::from(DEFAULT_LOCKOUT_MINUTES)),
        }
    }
}

impl GatePolicy {
    pub fn new(max_attempts: u32, lockout_minutes: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout_window: Duration::minutes(i64::from(lockout_minutes)),
        }
    }

    /// Locked iff the recorded failures reach the budget and the single most
    /// recent failure is younger than the window. Failures are never pruned,
    /// so once the window passes a single further miss re-locks the gate.
    pub fn is_locked_out(&self, ledger: &Ledger, now: DateTime<Utc>) -> bool {
        self.lockout_remaining(ledger, now).is_some()
    }

    /// Whole seconds (at least 1) until the window closes, or `None` when
    /// the gate is evaluable.
    pub fn lockout_remaining(&self, ledger: &Ledger, now: DateTime<Utc>) -> Option<u64> {
        if ledger.failure_count() < self.max_attempts as usize {
            return None;
        }
        let last = ledger.last_failure()?;
        // A failure stamped in the future (clock skew) counts as just now.
        let elapsed = (now - last).max(Duration::zero());
        if elapsed >= self.lockout_window {
            return None;
        }
        let remaining = (self.lockout_window - elapsed).num_seconds();
        Some(u64::try_from(remaining).unwrap_or(0).max(1))
    }
}

/// Constant-time equality comparison for secret strings.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Validates a presented secret against the ledger and the lockout policy.
/// Sole writer of the ledger's attempt history.
pub struct AccessGate {
    secret: Zeroizing<String>,
    policy: GatePolicy,
    ledger: Arc<AttemptLedger>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("secret", &"[REDACTED]")
            .field("policy", &self.policy)
            .field("ledger", &self.ledger.location())
            .finish()
    }
}

impl AccessGate {
    pub fn new(secret: &str, policy: GatePolicy, ledger: Arc<AttemptLedger>) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_string()),
            policy,
            ledger,
        }
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    pub fn ledger(&self) -> &Arc<AttemptLedger> {
        &self.ledger
    }

    /// Check `candidate` and record the attempt.
    ///
    /// A locked-out caller is rejected before the secret is compared and
    /// nothing is recorded. A failed ledger write is returned as an error
    /// and never turns into a granted decision.
    pub fn verify(&self, candidate: &str) -> Result<GateDecision, PersistenceError> {
        let policy = self.policy;
        let decision = self.ledger.update(|ledger, now| {
            if let Some(retry) = policy.lockout_remaining(ledger, now) {
                return GateDecision::locked_out(Some(retry));
            }

            if constant_time_eq(candidate, &self.secret) {
                ledger.successes.push(now);
                return GateDecision::granted(policy.max_attempts);
            }

            ledger.failures.push(now);
            let failures = u32::try_from(ledger.failure_count()).unwrap_or(u32::MAX);
            match policy.max_attempts.checked_sub(failures) {
                Some(remaining) if remaining > 0 => GateDecision::wrong_secret(remaining),
                _ => GateDecision::locked_out(policy.lockout_remaining(ledger, now)),
            }
        })?;

        match decision.reason {
            GateReason::Ok => tracing::info!("gate: access granted"),
            GateReason::WrongSecret => tracing::warn!(
                attempts_remaining = decision.attempts_remaining,
                "gate: wrong secret"
            ),
            GateReason::LockedOut => tracing::warn!(
                retry_after_secs = decision.retry_after_secs.unwrap_or_default(),
                "gate: locked out"
            ),
        }

        Ok(decision)
    }

    /// Read-only lockout probe; records nothing.
    pub fn lockout_remaining_now(&self) -> Option<u64> {
        let ledger = self.ledger.load();
        self.policy
            .lockout_remaining(&ledger, self.ledger.clock().now())
    }
}
