use reqwest::Client;
use std::time::Duration;

/// Fixed user agent; the relay never forwards caller-identifying headers.
pub const RELAY_USER_AGENT: &str = concat!("scriptgate/", env!("CARGO_PKG_VERSION"));

pub fn build_provider_client_with_timeout(timeout_secs: u64) -> Client {
    Client::builder()
        .user_agent(RELAY_USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}
