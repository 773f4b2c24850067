use crate::config::Config;

fn yes_no(value: bool) -> &'static str {
    if value { "configured" } else { "missing" }
}

pub fn render_status(config: &Config) -> String {
    let identity = &config.identity;
    let mut lines = vec![
        format!("◆ {} status", identity.service_name),
        String::new(),
        format!("Version     {}", identity.version),
    ];
    if let Some(developer) = identity.developer.as_deref() {
        lines.push(format!("Developer   {developer}"));
    }
    lines.extend([
        format!("Workspace   {}", config.workspace_dir.display()),
        format!("Config      {}", config.config_path.display()),
        String::new(),
        format!("Provider    {} ({})", config.provider.name, config.provider.base_url),
        format!("  model       {}", config.provider.model),
        format!("  api key     {}", yes_no(config.provider.has_api_key())),
        format!("  timeout     {}s", config.provider.timeout_secs),
        String::new(),
        format!("Gate        secret {}", yes_no(config.gate.secret().is_some())),
        format!("  attempts    {}", config.gate.max_attempts),
        format!("  lockout     {} min", config.gate.lockout_minutes),
        format!("  ledger      {}", config.ledger_path().display()),
        String::new(),
        format!("Gateway     {}:{}", config.gateway.host, config.gateway.port),
    ]);
    lines.join("\n")
}
