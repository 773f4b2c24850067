use crate::security::GateDecision;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `ScriptGate`.
///
/// Library callers (the HTTP gateway, the CLI) match on these to pick a
/// status code or exit message; internal code keeps using `anyhow::Result`
/// for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Malformed input ─────────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Gate denied the credential ──────────────────────────────────────
    #[error("access denied: {}", .0.message)]
    Auth(GateDecision),

    // ── Ledger storage ──────────────────────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Validation errors ──────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("prompt too short: need at least {min} characters, got {actual}")]
    PromptTooShort { min: usize, actual: usize },
}

// ─── Persistence errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to save ledger: {0:#}")]
    Save(anyhow::Error),
}

// ─── Provider errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} did not answer within {timeout_secs}s")]
    Timeout { provider: String, timeout_secs: u64 },

    #[error("{provider} returned an unreadable response: {message}")]
    Decode { provider: String, message: String },

    #[error("{provider} API key not configured")]
    NotConfigured { provider: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, RelayError>;
