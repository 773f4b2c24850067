use super::super::{GateConfig, GatewayConfig, ProviderConfig};
use crate::error::ConfigError;
use crate::gateway::REQUEST_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_LEDGER_FILENAME: &str = "access_ledger.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// What the status endpoint and the provenance header report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_service_name() -> String {
    "ScriptGate".into()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            developer: None,
            version: default_version(),
        }
    }
}

impl Config {
    /// Ledger location: `gate.ledger_path` with `~` expanded, relative paths
    /// anchored at the workspace, else `<workspace>/access_ledger.json`.
    pub fn ledger_path(&self) -> PathBuf {
        match self.gate.ledger_path.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
                if expanded.is_absolute() {
                    expanded
                } else {
                    self.workspace_dir.join(expanded)
                }
            }
            _ => self.workspace_dir.join(DEFAULT_LEDGER_FILENAME),
        }
    }

    /// Range checks that apply to every command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "gate.max_attempts must be at least 1".into(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "provider.timeout_secs must be at least 1".into(),
            ));
        }
        // The HTTP layer must outlive the provider call or the fallback is lost.
        if self.provider.timeout_secs >= REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "provider.timeout_secs must be below the {REQUEST_TIMEOUT_SECS}s gateway request timeout, got {}",
                self.provider.timeout_secs
            )));
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::Validation(format!(
                "provider.temperature must be within 0.0..=2.0, got {}",
                self.provider.temperature
            )));
        }
        Ok(())
    }

    /// Everything `validate` checks, plus a configured gate secret.
    pub fn validate_for_serving(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.gate.secret().is_none() {
            return Err(ConfigError::Validation(format!(
                "gate.secret is not set. Add it under [gate] in {} or export SCRIPTGATE_SECRET.",
                self.config_path.display()
            )));
        }
        Ok(())
    }
}
