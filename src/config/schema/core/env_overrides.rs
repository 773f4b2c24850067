use super::Config;
use std::path::PathBuf;

fn non_empty_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_var(&["SCRIPTGATE_SECRET"]) {
            self.gate.secret = Some(secret);
        }

        if let Some(key) = non_empty_var(&["SCRIPTGATE_API_KEY", "DEEPSEEK_API_KEY"]) {
            self.provider.api_key = Some(key);
        }

        if let Some(model) = non_empty_var(&["SCRIPTGATE_MODEL"]) {
            self.provider.model = model;
        }

        if let Some(url) = non_empty_var(&["SCRIPTGATE_PROVIDER_URL"]) {
            self.provider.base_url = url;
        }

        if let Some(workspace) = non_empty_var(&["SCRIPTGATE_WORKSPACE"]) {
            self.workspace_dir = PathBuf::from(workspace);
        }

        if let Some(port_str) = non_empty_var(&["SCRIPTGATE_GATEWAY_PORT", "PORT"])
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Some(host) = non_empty_var(&["SCRIPTGATE_GATEWAY_HOST", "HOST"]) {
            self.gateway.host = host;
        }
    }
}
