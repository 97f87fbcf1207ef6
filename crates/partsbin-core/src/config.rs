use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment, ProxyPolicy};
use crate::ConfigError;

const DEFAULT_PROXY_HOSTS: &str =
    "upload.wikimedia.org,commons.wikimedia.org,external-content.duckduckgo.com";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_url = require("PARTSBIN_API_URL")?;
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARTSBIN_API_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{api_url}\""),
        });
    }

    let env = parse_environment(&or_default("PARTSBIN_ENV", "development"))?;
    let log_level = or_default("PARTSBIN_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("PARTSBIN_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PARTSBIN_USER_AGENT", "partsbin/0.1 (quick-add)");
    let max_retries = parse_u32("PARTSBIN_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PARTSBIN_RETRY_BACKOFF_BASE_MS", "500")?;

    let proxy_policy = parse_proxy_policy(&or_default("PARTSBIN_PROXY_POLICY", "always"))?;
    let proxy_hosts = parse_host_list(&or_default("PARTSBIN_PROXY_HOSTS", DEFAULT_PROXY_HOSTS));

    let prefs_path = PathBuf::from(or_default("PARTSBIN_PREFS_PATH", ".partsbin/prefs.json"));

    Ok(AppConfig {
        api_url,
        env,
        log_level,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        proxy_policy,
        proxy_hosts,
        prefs_path,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARTSBIN_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_proxy_policy(s: &str) -> Result<ProxyPolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "always" => Ok(ProxyPolicy::Always),
        "allow-list" | "allowlist" => Ok(ProxyPolicy::AllowList),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARTSBIN_PROXY_POLICY".to_string(),
            reason: format!("expected \"always\" or \"allow-list\", got \"{other}\""),
        }),
    }
}

fn parse_host_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
