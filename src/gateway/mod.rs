//! Axum-based HTTP gateway: a thin transport over [`RelayService`].
//!
//! - Request body size limits (64KB max)
//! - Request timeouts (30s), longer than the provider timeout
//! - Refuses non-loopback binds unless explicitly allowed

mod handlers;
mod server;

pub use server::{
    build_app, is_public_bind, run_gateway, run_gateway_until, run_gateway_with_listener,
};

use crate::pipeline::RelayService;
use serde::Deserialize;
use std::sync::Arc;

/// Maximum request body size (64KB) -- prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s) -- prevents slow-loris attacks
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
}

/// `POST /api/verify` body. Older clients send the secret as `pin`.
#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(alias = "pin")]
    pub secret: String,
}

/// `POST /api/generate` body. A missing prompt is reported after the gate
/// has ruled on the secret.
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(alias = "pin")]
    pub secret: String,
    #[serde(default)]
    pub prompt: Option<String>,
}
