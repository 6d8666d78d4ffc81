pub mod schema;

use crate::error::{GlowError, Result};
use schema::AppConfig;
use std::path::Path;

/// Load and parse configuration from a TOML file.
///
/// # Errors
/// Returns `GlowError::ConfigNotFound` if the file doesn't exist,
/// `GlowError::Io` on read errors, `GlowError::TomlParse` on syntax errors,
/// or `GlowError::Config` on validation failures.
pub fn load(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(GlowError::ConfigNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse and validate configuration text.
///
/// # Errors
/// Returns `GlowError::TomlParse` on syntax errors or `GlowError::Config`
/// on validation failures.
pub fn parse(content: &str) -> Result<AppConfig> {
    let content = expand_env_vars(content);
    let config: AppConfig = toml::from_str(&content)?;

    validate(&config)?;
    Ok(config)
}

/// Expand `${VAR}` and `$VAR` patterns in the config string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let var_name: String = chars.by_ref().take_while(|&c| c != '}').collect();
            if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Unknown variables stay as written.
                result.push_str("${");
                result.push_str(&var_name);
                result.push('}');
            }
            continue;
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            var_name.push(c);
            chars.next();
        }
        match std::env::var(&var_name) {
            Ok(val) if !var_name.is_empty() => result.push_str(&val),
            _ => {
                result.push('$');
                result.push_str(&var_name);
            }
        }
    }

    result
}

/// Validate config constraints.
///
/// # Errors
/// Returns `GlowError::Config` describing the first violated constraint.
pub fn validate(config: &AppConfig) -> Result<()> {
    let server = &config.glowd.opc_server;
    let valid_server = server
        .rsplit_once(':')
        .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
    if !valid_server {
        return Err(GlowError::Config(format!(
            "opc_server must be host:port, got {server:?}"
        )));
    }

    if config.glowd.shutdown_timeout_ms == 0 {
        return Err(GlowError::Config(
            "shutdown_timeout_ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
