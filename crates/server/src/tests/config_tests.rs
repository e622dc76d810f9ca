use super::*;

#[test]
fn defaults_bind_loopback_without_seed() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8787");
    assert_eq!(settings.seed_path, None);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "bind_addr = \"0.0.0.0:9000\"\nseed_path = \"./seed/quotes.json\"\n",
    );

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.seed_path, Some(PathBuf::from("./seed/quotes.json")));
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "bind_addr = [1, 2]");
    assert_eq!(settings, Settings::default());
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "bind_addr = \"0.0.0.0:9000\"");

    let env: HashMap<&str, &str> = HashMap::from([
        ("SERVER_BIND", "127.0.0.1:1111"),
        ("APP__BIND_ADDR", "127.0.0.1:2222"),
        ("SERVER_SEED_PATH", "  "),
    ]);
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "127.0.0.1:2222");
    assert_eq!(settings.seed_path, None);
}
