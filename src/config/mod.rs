pub mod schema;

pub use schema::{Config, GateConfig, GatewayConfig, IdentityConfig, ProviderConfig};
