use serde::{Deserialize, Serialize};

/// One single-turn completion: a fixed system instruction plus the user
/// content.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system_prompt: &'a str,
    pub message: &'a str,
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    /// `usage.total_tokens` from the provider, 0 when absent.
    pub total_tokens: u64,
    pub model: Option<String>,
}

impl ProviderResponse {
    pub fn with_usage(text: String, total_tokens: u64) -> Self {
        Self {
            text,
            total_tokens,
            model: None,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }
}
