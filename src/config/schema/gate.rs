use crate::security::{DEFAULT_LOCKOUT_MINUTES, DEFAULT_MAX_ATTEMPTS, GatePolicy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Static shared secret callers must present. Required to serve.
    #[serde(default)]
    pub secret: Option<String>,
    /// Failures tolerated before lockout (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Lockout window after the most recent failure (default: 15)
    #[serde(default = "default_lockout_minutes")]
    pub lockout_minutes: u32,
    /// Ledger file; relative paths resolve against the workspace.
    #[serde(default)]
    pub ledger_path: Option<String>,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_lockout_minutes() -> u32 {
    DEFAULT_LOCKOUT_MINUTES
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            secret: None,
            max_attempts: default_max_attempts(),
            lockout_minutes: default_lockout_minutes(),
            ledger_path: None,
        }
    }
}

impl std::fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("max_attempts", &self.max_attempts)
            .field("lockout_minutes", &self.lockout_minutes)
            .field("ledger_path", &self.ledger_path)
            .finish()
    }
}

impl GateConfig {
    pub fn policy(&self) -> GatePolicy {
        GatePolicy::new(self.max_attempts, self.lockout_minutes)
    }

    /// Configured secret, ignoring blank values.
    pub fn secret(&self) -> Option<&str> {
        self.secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gate_config() {
        let config = GateConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.lockout_minutes, 15);
        assert!(config.secret().is_none());
        assert_eq!(config.policy(), GatePolicy::default());
    }

    #[test]
    fn blank_secret_is_treated_as_unset() {
        let config = GateConfig {
            secret: Some("   ".into()),
            ..GateConfig::default()
        };
        assert!(config.secret().is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: GateConfig = toml::from_str("secret = \"302010\"").unwrap();
        assert_eq!(config.secret(), Some("302010"));
        assert_eq!(config.max_attempts, 5);
        assert!(!format!("{config:?}").contains("302010"));
    }
}
