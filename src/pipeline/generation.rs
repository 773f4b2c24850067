//! Generation pipeline: one bounded provider call, output sanitizing, and a
//! deterministic local fallback when the provider cannot answer.

use super::classifier::Category;
use crate::config::IdentityConfig;
use crate::error::{ProviderError, ValidationError};
use crate::llm::{CompletionRequest, Provider};
use crate::security::Clock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const MIN_PROMPT_CHARS: usize = 3;
/// How much of the caller's prompt the fallback template echoes.
pub const FALLBACK_PROMPT_PREFIX_CHARS: usize = 50;

pub const SYSTEM_INSTRUCTION: &str = "You are a Luau scripting assistant for Roblox. \
Produce complete, working Luau code for the request. Include: \
1. activation toggled by a key press; \
2. short explanatory comments; \
3. debug messages with print; \
4. tidy, efficient code. \
Return ONLY Luau code, with no markdown and no explanations.";

/// A caller's free-text request, trimmed and length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
}

impl GenerationRequest {
    pub fn new(raw_prompt: &str) -> Result<Self, ValidationError> {
        let prompt = raw_prompt.trim();
        let actual = prompt.chars().count();
        if actual < MIN_PROMPT_CHARS {
            return Err(ValidationError::PromptTooShort {
                min: MIN_PROMPT_CHARS,
                actual,
            });
        }
        Ok(Self {
            prompt: prompt.to_string(),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Uniform result of a generation attempt. `code` always holds either the
/// provider output or the fallback template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub succeeded: bool,
    pub code: String,
    pub provider_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Per-call provider parameters.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
}

pub struct GenerationPipeline {
    provider: Arc<dyn Provider>,
    settings: PipelineSettings,
    identity: IdentityConfig,
    clock: Arc<dyn Clock>,
}

impl GenerationPipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        settings: PipelineSettings,
        identity: IdentityConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            settings,
            identity,
            clock,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `instruction` to the provider once. Never fails: any provider
    /// error, timeout included, is folded into a fallback result built from
    /// the original request.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        instruction: &str,
    ) -> GenerationResult {
        match self.call_provider(instruction).await {
            Ok((text, tokens, model)) => GenerationResult {
                succeeded: true,
                code: self.with_provenance(&text),
                provider_tokens: tokens,
                error_detail: None,
                fallback: None,
                model,
                category: None,
            },
            Err(error) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    error = %error,
                    "generation failed, serving local fallback"
                );
                let fallback = fallback_script(&self.identity.service_name, request.prompt());
                GenerationResult {
                    succeeded: false,
                    code: fallback.clone(),
                    provider_tokens: 0,
                    error_detail: Some(error.to_string()),
                    fallback: Some(fallback),
                    model: None,
                    category: None,
                }
            }
        }
    }

    async fn call_provider(
        &self,
        instruction: &str,
    ) -> Result<(String, u64, Option<String>), ProviderError> {
        let request = CompletionRequest {
            system_prompt: SYSTEM_INSTRUCTION,
            message: instruction,
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = tokio::time::timeout(self.settings.timeout, self.provider.complete(request))
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: self.provider.name().to_string(),
                timeout_secs: self.settings.timeout.as_secs(),
            })??;

        let code = strip_code_fences(&response.text);
        if code.is_empty() {
            return Err(ProviderError::Decode {
                provider: self.provider.name().to_string(),
                message: "empty completion".to_string(),
            });
        }
        Ok((code, response.total_tokens, response.model))
    }

    fn with_provenance(&self, code: &str) -> String {
        let mut header = format!("-- {} - generated script\n", self.identity.service_name);
        if let Some(developer) = self.identity.developer.as_deref() {
            header.push_str(&format!("-- Developer: {developer}\n"));
        }
        header.push_str(&format!(
            "-- Generated: {} UTC\n-- Version: {}\n\
             -- Policy: access to this relay is gated; never share your access secret.\n\n",
            self.clock.now().format("%d/%m/%Y %H:%M"),
            self.identity.version,
        ));
        header + code
    }
}

const FENCE: &str = "```";
const FENCE_LANGUAGE_TAGS: &[&str] = &["luau", "lua"];

/// Remove markdown fence markers (```lua, ```) and keep everything between
/// them, including code sharing a line with a fence.
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for (index, segment) in text.split(FENCE).enumerate() {
        // Odd segments open after a fence and may start with a language tag.
        let segment = if index % 2 == 1 {
            strip_language_tag(segment)
        } else {
            segment
        };
        cleaned.push_str(segment);
    }
    cleaned.trim().to_string()
}

fn strip_language_tag(segment: &str) -> &str {
    // A lone word on the fence line is a tag, whatever the language.
    if let Some((first_line, rest)) = segment.split_once('\n') {
        let tag = first_line.trim();
        if !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '+')
        {
            return rest;
        }
    }
    for tag in FENCE_LANGUAGE_TAGS {
        if let Some(rest) = segment.strip_prefix(tag)
            && rest.chars().next().is_none_or(char::is_whitespace)
        {
            return rest;
        }
    }
    segment
}

/// Deterministic placeholder script echoing the request.
pub fn fallback_script(service_name: &str, prompt: &str) -> String {
    let single_line = prompt.replace(['\r', '\n'], " ");
    let prefix: String = single_line
        .chars()
        .take(FALLBACK_PROMPT_PREFIX_CHARS)
        .collect();
    let prefix = prefix.replace('\\', "\\\\").replace('"', "\\\"");

    format!(
        "-- {service_name} script (local fallback)\n\
         -- Prompt: {single_line}\n\
         \n\
         print(\"{service_name} - script loaded\")\n\
         print(\"Feature: {prefix}...\")\n\
         \n\
         -- Add your Luau logic here\n\
         -- This is a basic template"
    )
}
