mod core;
mod gate;
mod gateway;
mod provider;

pub use self::core::{Config, IdentityConfig};
pub use gate::GateConfig;
pub use gateway::GatewayConfig;
pub use provider::ProviderConfig;
