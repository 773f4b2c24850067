//! Generic OpenAI-compatible provider.
//! DeepSeek, OpenAI, and most hosted LLM APIs accept the same
//! `/chat/completions` request, so one implementation serves all of them.

use super::http_client::build_provider_client_with_timeout;
use super::scrub::sanitize_api_error;
use super::traits::{Provider, ProviderFuture};
use super::types::{CompletionRequest, ProviderResponse};
use crate::error::ProviderError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// A provider that speaks the OpenAI-compatible chat completions API.
pub struct OpenAiCompatibleProvider {
    name: String,
    api_key: Option<String>,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    chat_url: String,
    timeout_secs: u64,
    client: Client,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("chat_url", &self.chat_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            name: name.to_string(),
            api_key: api_key
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToString::to_string),
            chat_url,
            timeout_secs,
            client: build_provider_client_with_timeout(timeout_secs),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn transport_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                provider: self.name.clone(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            ProviderError::Transport {
                provider: self.name.clone(),
                message: sanitize_api_error(&error.to_string()),
            }
        }
    }

    async fn call_chat_completions(
        &self,
        request: CompletionRequest<'_>,
    ) -> Result<ProviderResponse, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured {
                provider: self.name.clone(),
            });
        };

        let body = ChatRequest {
            model: request.model,
            messages: vec![
                Message {
                    role: "system",
                    content: request.system_prompt,
                },
                Message {
                    role: "user",
                    content: request.message,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: status.as_u16(),
                body: sanitize_api_error(&error_body),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(&e)
            } else {
                ProviderError::Decode {
                    provider: self.name.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Decode {
                provider: self.name.clone(),
                message: "response contained no choices".to_string(),
            })?;

        let total_tokens = chat.usage.and_then(|u| u.total_tokens).unwrap_or(0);
        let mut out = ProviderResponse::with_usage(text, total_tokens);
        if let Some(model) = chat.model {
            out = out.with_model(model);
        }
        Ok(out)
    }
}

impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(&'a self, request: CompletionRequest<'a>) -> ProviderFuture<'a, ProviderResponse> {
        Box::pin(self.call_chat_completions(request))
    }

    fn warmup(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            // Any response (even 404) means the TLS pool is primed.
            let _ = self.client.get(&self.chat_url).send().await;
            Ok(())
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
