use std::{collections::HashMap, fs, path::PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub seed_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8787".into(),
            seed_path: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        tracing::warn!("config: ignoring server.toml that is not a flat string table");
        return;
    };
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("seed_path") {
        settings.seed_path = non_empty_path(v);
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = var("SERVER_SEED_PATH") {
        settings.seed_path = non_empty_path(&v);
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| PathBuf::from(raw))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
