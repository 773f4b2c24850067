use super::types::{CompletionRequest, ProviderResponse};
use crate::error::ProviderError;
use std::future::Future;
use std::pin::Pin;

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Remote text-generation capability.
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "deepseek").
    fn name(&self) -> &str;

    /// Issue exactly one completion call. Implementations do not retry.
    fn complete<'a>(&'a self, request: CompletionRequest<'a>) -> ProviderFuture<'a, ProviderResponse>;

    /// Warm up the HTTP connection pool.
    fn warmup(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move { Ok(()) })
    }
}
