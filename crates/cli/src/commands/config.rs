use cardesk_core::config::{AppConfig, LlmProvider, LoadOptions, LogFormat};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render("database.url", &config.database.url));
    lines.push(render("database.max_connections", &config.database.max_connections.to_string()));
    lines.push(render("database.timeout_secs", &config.database.timeout_secs.to_string()));

    lines.push(render("llm.provider", provider_name(config.llm.provider)));
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact(key.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render("llm.api_key", &api_key));
    lines.push(render("llm.base_url", config.llm.base_url.as_deref().unwrap_or("(default)")));
    lines.push(render("llm.model", &config.llm.model));
    lines.push(render("llm.temperature", &config.llm.temperature.to_string()));
    lines.push(render("llm.max_output_tokens", &config.llm.max_output_tokens.to_string()));
    lines.push(render("llm.timeout_secs", &config.llm.timeout_secs.to_string()));

    lines.push(render("server.bind_address", &config.server.bind_address));
    lines.push(render("server.port", &config.server.port.to_string()));
    lines.push(render("server.health_check_port", &config.server.health_check_port.to_string()));

    lines.push(render("crm.enabled", &config.crm.enabled.to_string()));
    lines.push(render("crm.odoo_url", config.crm.odoo_url.as_deref().unwrap_or("(unset)")));
    lines.push(render(
        "crm.odoo_database",
        config.crm.odoo_database.as_deref().unwrap_or("(unset)"),
    ));
    let odoo_token = config
        .crm
        .odoo_token
        .as_ref()
        .map(|token| redact(token.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());
    lines.push(render("crm.odoo_token", &odoo_token));

    lines.push(render("logging.level", &config.logging.level));
    lines.push(render("logging.format", format_name(config.logging.format)));

    lines.join("\n")
}

fn render(key: &str, value: &str) -> String {
    format!("  {key} = {value}")
}

fn provider_name(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Gemini => "gemini",
        LlmProvider::OpenAi => "openai",
        LlmProvider::Ollama => "ollama",
    }
}

fn format_name(format: LogFormat) -> &'static str {
    match format {
        LogFormat::Compact => "compact",
        LogFormat::Pretty => "pretty",
        LogFormat::Json => "json",
    }
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..4])
    }
}
