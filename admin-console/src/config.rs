use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use common_auth::ExpiryConfig;
use common_observability::DEFAULT_HISTORY_LIMIT;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LEEWAY_SECS: u32 = 30;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub session_file: PathBuf,
    pub error_history_limit: usize,
    pub token_leeway_secs: u32,
    pub proactive_refresh: bool,
}

impl ConsoleConfig {
    pub fn expiry(&self) -> ExpiryConfig {
        ExpiryConfig::new().with_leeway(self.token_leeway_secs)
    }
}

pub fn load_console_config() -> Result<ConsoleConfig> {
    load_console_config_from(|key| env::var(key).ok())
}

/// Builds the config from an arbitrary variable lookup.
pub fn load_console_config_from<F>(lookup: F) -> Result<ConsoleConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_url = lookup("RECALLIQ_API_URL")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(anyhow!(
            "RECALLIQ_API_URL must be an http(s) URL, got '{api_url}'"
        ));
    }
    let api_url = api_url.trim_end_matches('/').to_string();

    let timeout_secs = parse_number(&lookup, "RECALLIQ_HTTP_TIMEOUT_SECS")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let session_file = match lookup("RECALLIQ_SESSION_FILE").and_then(|v| normalize_optional(&v)) {
        Some(path) => PathBuf::from(path),
        None => default_session_file()?,
    };

    let error_history_limit = parse_number(&lookup, "RECALLIQ_ERROR_HISTORY_LIMIT")?
        .unwrap_or(DEFAULT_HISTORY_LIMIT);
    let token_leeway_secs = parse_number(&lookup, "RECALLIQ_TOKEN_LEEWAY_SECS")?
        .unwrap_or(DEFAULT_LEEWAY_SECS);
    let proactive_refresh = bool_from(&lookup, "RECALLIQ_PROACTIVE_REFRESH").unwrap_or(true);

    Ok(ConsoleConfig {
        api_url,
        timeout: Duration::from_secs(timeout_secs),
        session_file,
        error_history_limit,
        token_leeway_secs,
        proactive_refresh,
    })
}

fn default_session_file() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("Unable to determine a data directory; set RECALLIQ_SESSION_FILE")?;
    Ok(base.join("recalliq").join("session.json"))
}

fn parse_number<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .and_then(|value| normalize_optional(&value))
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| anyhow!("Invalid {key} '{value}': {err}"))
        })
        .transpose()
}

fn bool_from<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config =
            load_console_config_from(lookup(&[("RECALLIQ_SESSION_FILE", "/tmp/s.json")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.error_history_limit, 20);
        assert_eq!(config.token_leeway_secs, 30);
        assert!(config.proactive_refresh);
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn overrides_are_parsed_and_normalised() {
        let config = load_console_config_from(lookup(&[
            ("RECALLIQ_API_URL", " https://api.example.com/api/ "),
            ("RECALLIQ_HTTP_TIMEOUT_SECS", "5"),
            ("RECALLIQ_ERROR_HISTORY_LIMIT", "50"),
            ("RECALLIQ_PROACTIVE_REFRESH", "off"),
            ("RECALLIQ_SESSION_FILE", "/tmp/s.json"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.error_history_limit, 50);
        assert!(!config.proactive_refresh);
    }

    #[test]
    fn invalid_values_are_errors() {
        let err = load_console_config_from(lookup(&[
            ("RECALLIQ_HTTP_TIMEOUT_SECS", "soon"),
            ("RECALLIQ_SESSION_FILE", "/tmp/s.json"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("RECALLIQ_HTTP_TIMEOUT_SECS"));

        assert!(load_console_config_from(lookup(&[("RECALLIQ_API_URL", "localhost:8000")])).is_err());
    }
}
