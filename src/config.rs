use crate::constants::{DEFAULT_RELOAD_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_WEBHOOK_URL};
use crate::errors::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// What the webhook receives in its `persona` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaField {
    /// Short workflow code, e.g. `ТОП`.
    Code,
    /// Persona display name, e.g. `Top Manager`.
    Name,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webhook_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub request_timeout_secs: u64,
    pub reload_delay_ms: u64,
    pub typewriter_enabled: bool,
    pub typewriter_chars_per_tick: usize,
    pub realtime_enabled: bool,
    pub realtime_poll_ms: u64,
    pub persona_field: PersonaField,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reload_delay_ms: DEFAULT_RELOAD_DELAY_MS,
            typewriter_enabled: true,
            typewriter_chars_per_tick: 2,
            realtime_enabled: false,
            realtime_poll_ms: 1500,
            persona_field: PersonaField::Code,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn realtime_poll_interval(&self) -> Duration {
        Duration::from_millis(self.realtime_poll_ms)
    }

    /// Characters revealed per UI tick, or `None` when the typewriter is off.
    pub fn typewriter_step(&self) -> Option<usize> {
        self.typewriter_enabled
            .then_some(self.typewriter_chars_per_tick)
    }
}

/// Loads the config from `~/.config/insights-agent/config.json`, writing the
/// defaults there on first run, then applies environment overrides.
pub fn load_config() -> AgentResult<Config> {
    let config_path = get_config_path()?;
    load_config_from(&config_path, |key| env::var(key).ok())
}

pub fn load_config_from(
    config_path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> AgentResult<Config> {
    let mut config = if config_path.exists() {
        let config_str = fs::read_to_string(config_path)
            .map_err(|e| AgentError::config_error(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&config_str)
            .map_err(|e| AgentError::config_error(format!("Failed to parse config: {}", e)))?
    } else {
        let config = Config::default();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AgentError::config_error(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config_str = serde_json::to_string_pretty(&config)
            .map_err(|e| AgentError::config_error(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, config_str)
            .map_err(|e| AgentError::config_error(format!("Failed to write config file: {}", e)))?;

        config
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config)?;

    Ok(config)
}

fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("INSIGHTS_WEBHOOK_URL").or_else(|| lookup("VITE_API_ENDPOINT")) {
        config.webhook_url = url;
    }
    if let Some(url) = lookup("SUPABASE_URL") {
        config.supabase_url = url;
    }
    if let Some(key) = lookup("SUPABASE_ANON_KEY") {
        config.supabase_anon_key = key;
    }
}

fn get_config_path() -> AgentResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| AgentError::config_error("Could not determine home directory"))?;

    Ok(home_dir
        .join(".config")
        .join("insights-agent")
        .join("config.json"))
}

pub fn validate_config(config: &Config) -> AgentResult<()> {
    for (name, value) in [
        ("webhook_url", &config.webhook_url),
        ("supabase_url", &config.supabase_url),
    ] {
        if value.is_empty() {
            return Err(AgentError::config_error(format!("{} is required", name)));
        }
        reqwest::Url::parse(value)
            .map_err(|e| AgentError::config_error(format!("{} is not a valid URL: {}", name, e)))?;
    }

    if config.supabase_anon_key.is_empty() {
        return Err(AgentError::config_error("supabase_anon_key is required"));
    }

    if config.request_timeout_secs == 0 {
        return Err(AgentError::config_error(
            "request_timeout_secs must be greater than 0",
        ));
    }

    if config.typewriter_chars_per_tick == 0 {
        return Err(AgentError::config_error(
            "typewriter_chars_per_tick must be greater than 0",
        ));
    }

    if config.realtime_enabled && config.realtime_poll_ms == 0 {
        return Err(AgentError::config_error(
            "realtime_poll_ms must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn valid_config() -> Config {
        Config {
            supabase_url: "https://project.supabase.co".to_string(),
            supabase_anon_key: "anon".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_config_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_default_config_needs_supabase_settings() {
        assert!(validate_config(&Config::default()).is_err());
    }

    #[test]
    fn test_validate_config_invalid_webhook_url() {
        let mut config = valid_config();
        config.webhook_url = "not a url".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_config_zero_timeout() {
        let mut config = valid_config();
        config.request_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_first_run_writes_defaults_and_env_fills_gaps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = load_config_from(&path, |key| match key {
            "SUPABASE_URL" => Some("https://project.supabase.co".to_string()),
            "SUPABASE_ANON_KEY" => Some("anon".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(path.exists());
        assert_eq!(config.webhook_url, DEFAULT_WEBHOOK_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));

        let written: Config = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.supabase_url.is_empty());
    }

    #[test]
    fn test_webhook_url_env_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, serde_json::to_string(&valid_config()).unwrap()).unwrap();

        let config = load_config_from(&path, |key| match key {
            "VITE_API_ENDPOINT" => Some("https://hooks.example.com/chat".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.webhook_url, "https://hooks.example.com/chat");
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"supabase_url":"https://p.supabase.co","supabase_anon_key":"k","persona_field":"name"}"#,
        )
        .unwrap();

        let config = load_config_from(&path, |_| None).unwrap();
        assert_eq!(config.persona_field, PersonaField::Name);
        assert_eq!(config.typewriter_step(), Some(2));
        assert_eq!(config.reload_delay(), Duration::from_millis(2000));
    }
}
