// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Provider implementations ────────────────────────────────────────────────
pub mod compatible;

pub use compatible::{DEEPSEEK_BASE_URL, OpenAiCompatibleProvider};
pub use http_client::{RELAY_USER_AGENT, build_provider_client_with_timeout};
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::{Provider, ProviderFuture};
pub use types::{CompletionRequest, ProviderResponse};

use crate::config::ProviderConfig;
use std::sync::Arc;

/// Build the configured provider. Only OpenAI-compatible endpoints are
/// supported; `name` is used for logs and error messages.
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatibleProvider::new(
        &config.name,
        &config.base_url,
        config.api_key.as_deref(),
        config.timeout_secs,
    ))
}
