//! `config show`: print the effective configuration.

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::config::{ConfigFile, FileConfigProvider, TOKEN_ENV, URL_ENV};
use crate::error::Result;

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn source(env_var: &str, in_file: bool) -> &'static str {
    if std::env::var(env_var).is_ok_and(|v| !v.is_empty()) {
        "environment"
    } else if in_file {
        "config file"
    } else {
        "unset"
    }
}

/// Show current configuration
pub fn cmd_config_show(provider: &FileConfigProvider, output_json: bool) -> Result<()> {
    let path = provider.path();
    let config = ConfigFile::load_from(path)?;

    let url = config.effective_url();
    let token = config.effective_token().map(|t| mask_sensitive_value(&t));
    let url_source = source(URL_ENV, config.url.is_some());
    let token_source = source(TOKEN_ENV, config.token.is_some());

    let json_output = json!({
        "config_file": path.to_string_lossy(),
        "config_file_exists": path.exists(),
        "url": url,
        "url_source": url_source,
        "token": token,
        "token_source": token_source,
        "per_page": config.per_page,
        "timeout": config.timeout,
        "search_debounce_ms": config.search_debounce_ms,
    });

    let not_configured = || "not configured".dimmed().to_string();

    let mut text_output = format!("{}\n\n", "Configuration:".cyan().bold());
    text_output.push_str(&format!(
        "  url: {} {}\n",
        url.clone().unwrap_or_else(not_configured),
        format!("({url_source})").dimmed()
    ));
    text_output.push_str(&format!(
        "  token: {} {}\n",
        token.clone().unwrap_or_else(not_configured),
        format!("({token_source})").dimmed()
    ));
    text_output.push_str(&format!("  per_page: {}\n", config.per_page));
    text_output.push_str(&format!("  timeout: {}s\n", config.timeout));
    text_output.push_str(&format!(
        "  search_debounce_ms: {}\n",
        config.search_debounce_ms
    ));
    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", path.display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}
