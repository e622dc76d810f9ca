use std::{fs, path::Path, time::Duration};

use client_core::DEFAULT_SYNC_INTERVAL;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "quotes.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub database_url: String,
    /// `None` keeps the client offline.
    pub server_url: Option<String>,
    pub sync_interval: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/quotes.db".into(),
            server_url: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    server_url: Option<String>,
    sync_interval_secs: Option<u64>,
}

pub fn load_settings(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

fn apply_file(settings: &mut ClientSettings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            warn!(error = %err, "config: ignoring unreadable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.database_url {
        settings.database_url = v;
    }
    if let Some(v) = file_cfg.server_url {
        settings.server_url = non_empty(&v);
    }
    if let Some(secs) = file_cfg.sync_interval_secs.filter(|secs| *secs > 0) {
        settings.sync_interval = Duration::from_secs(secs);
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("QUOTES_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("QUOTES_SERVER_URL") {
        settings.server_url = non_empty(&v);
    }
    if let Some(v) = var("QUOTES_SYNC_INTERVAL_SECS") {
        match v.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => settings.sync_interval = Duration::from_secs(secs),
            _ => warn!(value = %v, "config: ignoring invalid QUOTES_SYNC_INTERVAL_SECS"),
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ClientSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
