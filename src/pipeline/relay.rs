//! Request orchestration: gate, validate, classify, generate, count.

use super::classifier::classify_detailed;
use super::generation::{GenerationPipeline, GenerationRequest, GenerationResult, PipelineSettings};
use crate::config::{Config, IdentityConfig};
use crate::error::{ConfigError, RelayError, ValidationError};
use crate::llm::Provider;
use crate::security::{
    AccessGate, AttemptLedger, Clock, GateDecision, JsonFileLedgerStore, LedgerStore,
    SystemClock, UsageCounter,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Read-only snapshot served by the status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    pub ai_provider: String,
    pub model: String,
    pub privacy: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

impl ServiceStatus {
    pub fn new(identity: &IdentityConfig, provider: &str, model: &str) -> Self {
        let endpoints = BTreeMap::from([
            ("health", "GET /health"),
            ("status", "GET /api/status"),
            ("verify", "POST /api/verify"),
            ("generate", "POST /api/generate"),
        ]);
        Self {
            status: "online",
            service: identity.service_name.clone(),
            version: identity.version.clone(),
            developer: identity.developer.clone(),
            ai_provider: provider.to_string(),
            model: model.to_string(),
            privacy: "no_user_ip_collection",
            endpoints,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.identity, &config.provider.name, &config.provider.model)
    }
}

/// One relay instance: the gate, the generation pipeline and the usage
/// counter, all sharing one attempt ledger.
pub struct RelayService {
    gate: AccessGate,
    pipeline: GenerationPipeline,
    usage: UsageCounter,
    status: ServiceStatus,
}

impl RelayService {
    pub fn new(
        gate: AccessGate,
        pipeline: GenerationPipeline,
        usage: UsageCounter,
        status: ServiceStatus,
    ) -> Self {
        Self {
            gate,
            pipeline,
            usage,
            status,
        }
    }

    /// Wire a relay from configuration with the on-disk ledger and the
    /// system clock. Fails when no gate secret is configured.
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Result<Self, ConfigError> {
        let store: Arc<dyn LedgerStore> = Arc::new(JsonFileLedgerStore::new(config.ledger_path()));
        Self::with_store(config, provider, store, Arc::new(SystemClock))
    }

    /// Same as [`RelayService::from_config`] with an explicit store and clock.
    pub fn with_store(
        config: &Config,
        provider: Arc<dyn Provider>,
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate_for_serving()?;
        let secret = config
            .gate
            .secret()
            .ok_or_else(|| ConfigError::Validation("gate.secret is not set".into()))?;

        let ledger = Arc::new(AttemptLedger::new(store, clock.clone()));
        let gate = AccessGate::new(secret, config.gate.policy(), ledger.clone());
        let usage = UsageCounter::new(ledger);
        let pipeline = GenerationPipeline::new(
            provider,
            PipelineSettings {
                model: config.provider.model.clone(),
                temperature: config.provider.temperature,
                max_tokens: config.provider.max_tokens,
                timeout: Duration::from_secs(config.provider.timeout_secs),
            },
            config.identity.clone(),
            clock,
        );

        Ok(Self::new(gate, pipeline, usage, ServiceStatus::from_config(config)))
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn pipeline(&self) -> &GenerationPipeline {
        &self.pipeline
    }

    pub fn usage(&self) -> &UsageCounter {
        &self.usage
    }

    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }

    /// Credential check on its own.
    pub fn verify(&self, secret: &str) -> Result<GateDecision, RelayError> {
        Ok(self.gate.verify(secret)?)
    }

    /// Full request: the gate decides first, then the prompt is validated.
    /// A denied credential comes back as [`RelayError::Auth`] and a missing
    /// or short prompt as [`RelayError::Validation`]; neither reaches the
    /// provider. Provider failures are already folded into the result.
    pub async fn generate<'p>(
        &self,
        secret: &str,
        prompt: impl Into<Option<&'p str>>,
    ) -> Result<GenerationResult, RelayError> {
        let decision = self.gate.verify(secret)?;
        if !decision.allowed {
            return Err(RelayError::Auth(decision));
        }

        let prompt = prompt
            .into()
            .ok_or(ValidationError::MissingField("prompt"))?;
        let request = GenerationRequest::new(prompt)?;
        let classification = classify_detailed(request.prompt());
        tracing::debug!(
            category = classification.category.map_or("generic", |c| c.marker()),
            "prompt classified"
        );

        let mut result = self.pipeline.generate(&request, &classification.instruction).await;
        result.category = classification.category;

        // The result is already determined; a failed count must not hide it.
        match self.usage.increment() {
            Ok(total) => tracing::debug!(total_generations = total, "usage recorded"),
            Err(error) => tracing::warn!(error = %error, "failed to record usage"),
        }

        Ok(result)
    }
}
