use super::*;
use std::collections::HashMap;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:data\\quotes.db"),
        "sqlite://data/quotes.db"
    );
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("   "),
        ClientSettings::default().database_url
    );
}

#[test]
fn file_values_override_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(
        &mut settings,
        r#"
database_url = "./quotes.db"
server_url = "http://127.0.0.1:8787"
sync_interval_secs = 30
"#,
    );

    assert_eq!(settings.database_url, "./quotes.db");
    assert_eq!(settings.server_url.as_deref(), Some("http://127.0.0.1:8787"));
    assert_eq!(settings.sync_interval, Duration::from_secs(30));
}

#[test]
fn zero_interval_and_blank_server_are_ignored() {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, "server_url = \" \"\nsync_interval_secs = 0\n");

    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn unreadable_file_keeps_defaults() {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, "sync_interval_secs = \"soon\"");

    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn env_overrides_file() {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, "server_url = \"http://file:1\"");

    let env: HashMap<&str, &str> = HashMap::from([
        ("QUOTES_SERVER_URL", "http://env:2"),
        ("QUOTES_DATABASE_URL", "sqlite::memory:"),
        ("QUOTES_SYNC_INTERVAL_SECS", "5"),
    ]);
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_url.as_deref(), Some("http://env:2"));
    assert_eq!(settings.database_url, "sqlite::memory:");
    assert_eq!(settings.sync_interval, Duration::from_secs(5));
}

#[test]
fn invalid_env_interval_keeps_previous_value() {
    let mut settings = ClientSettings::default();
    apply_env(&mut settings, |key| {
        (key == "QUOTES_SYNC_INTERVAL_SECS").then(|| "never".to_string())
    });

    assert_eq!(settings.sync_interval, DEFAULT_SYNC_INTERVAL);
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = load_settings(&dir.path().join("absent.toml"));

    assert!(settings.database_url.starts_with("sqlite:"));
    assert!(settings.sync_interval > Duration::ZERO);
}
