use std::{collections::HashMap, fs, path::Path, time::Duration};

use client_core::transport::DEFAULT_ENDPOINT_PATH;
use tracing::warn;

pub const SETTINGS_FILE: &str = "predict.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub endpoint_path: String,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.into(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = path.unwrap_or_else(|| Path::new(SETTINGS_FILE));
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment overrides.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("server_url").and_then(as_text) {
                    settings.server_url = v;
                }
                if let Some(v) = file_cfg.get("endpoint_path").and_then(as_text) {
                    settings.endpoint_path = v;
                }
                if let Some(v) = file_cfg.get("request_timeout_secs").and_then(as_text) {
                    settings.request_timeout_secs = parse_timeout(&v);
                }
            }
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable settings file"),
        }
    }

    if let Some(v) = env("PREDICT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__ENDPOINT_PATH") {
        settings.endpoint_path = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_timeout(&v);
    }

    settings
}

fn as_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// Zero or garbage means "wait indefinitely".
fn parse_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|secs| *secs > 0)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
