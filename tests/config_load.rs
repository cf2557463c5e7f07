// tests/config_load.rs
use ad_copy_scraper::config::{Config, ENV_CONFIG_PATH};
use ad_copy_scraper::fetch::MAX_FETCH_ATTEMPTS;
use std::path::PathBuf;
use std::{env, fs};

#[test]
fn explicit_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("scraper.toml");
    fs::write(
        &p,
        r#"
[database]
path = "/var/lib/ads/ads.sqlite"

[fetch]
endpoint = "https://api.example/details/"
max_retries = 5
"#,
    )
    .unwrap();

    let cfg = Config::load(Some(&p)).unwrap();
    assert_eq!(cfg.database.path, PathBuf::from("/var/lib/ads/ads.sqlite"));
    assert_eq!(cfg.fetch.endpoint, "https://api.example/details");
    assert_eq!(cfg.fetch.max_retries, 5);
    assert_eq!(cfg.fetch.timeout_secs, 30);
}

#[test]
fn oversized_retry_count_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("scraper.toml");
    fs::write(&p, "[fetch]\nmax_retries = 250\n").unwrap();

    let cfg = Config::load(Some(&p)).unwrap();
    assert_eq!(cfg.fetch.max_retries, MAX_FETCH_ATTEMPTS);
}

#[test]
fn broken_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("scraper.toml");
    fs::write(&p, "[fetch\nmax_retries = ").unwrap();
    assert!(Config::load(Some(&p)).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // keep the real repo config/ out of the way
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    // 1) nothing on disk -> defaults
    let cfg = Config::load(None).unwrap();
    assert_eq!(cfg, Config::default());

    // 2) ./config/scraper.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("scraper.toml"), "[fetch]\nmax_delay_ms = 10\n").unwrap();
    let cfg = Config::load(None).unwrap();
    assert_eq!(cfg.fetch.max_delay_ms, 10);

    // 3) env wins over the fallback
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[fetch]\nmax_delay_ms = 99\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let cfg = Config::load(None).unwrap();
    assert_eq!(cfg.fetch.max_delay_ms, 99);

    // 4) env pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(Config::load(None).is_err());

    env::remove_var(ENV_CONFIG_PATH);
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn smtp_secrets_come_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("scraper.toml");
    fs::write(
        &p,
        r#"
[alert]
enabled = true
to = "ops@example.test"
"#,
    )
    .unwrap();

    env::remove_var("SMTP_USER");
    env::remove_var("SMTP_PASS");
    assert!(Config::load(Some(&p)).is_err());

    env::set_var("SMTP_USER", "bot@example.test");
    env::set_var("SMTP_PASS", "secret");
    let cfg = Config::load(Some(&p)).unwrap();
    assert_eq!(cfg.alert.username, "bot@example.test");
    assert_eq!(cfg.alert.password, "secret");
    assert_eq!(cfg.alert.from, "bot@example.test");

    env::remove_var("SMTP_USER");
    env::remove_var("SMTP_PASS");
}
