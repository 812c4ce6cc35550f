// tests/config_load.rs
use goal_scraper::config::{load, load_default, load_from};
use std::path::PathBuf;
use std::{env, fs};

const ENV_KEYS: [&str; 6] = [
    "GOALS_CONFIG_PATH",
    "GOALS_SOURCE_URL",
    "GOALS_TIMEOUT_MS",
    "GOALS_ARTIFACT_PATH",
    "BROWSERLESS_URL",
    "BROWSERLESS_TOKEN",
];

fn clear_env() {
    for k in ENV_KEYS {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn parse_toml_and_json_paths() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("goals.toml");
    fs::write(
        &p_toml,
        r##"
[selectors]
tables = [" #yw1 ", "", "table.items", "#yw1"]

[artifact]
path = "site/Road.astro"
"##,
    )
    .unwrap();
    let cfg = load_from(&p_toml).unwrap();
    assert_eq!(
        cfg.selectors.tables,
        vec!["#yw1".to_string(), "table.items".to_string()]
    );
    assert_eq!(cfg.artifact.path, PathBuf::from("site/Road.astro"));
    assert_eq!(cfg.artifact.array_name, "rawData");

    let p_json = dir.path().join("goals.json");
    fs::write(&p_json, r#"{ "classify": { "non_official": [" Exhibition ", ""] } }"#).unwrap();
    let cj = load_from(&p_json).unwrap();
    assert_eq!(cj.classify.non_official, vec!["Exhibition".to_string()]);

    let bad = dir.path().join("broken.toml");
    fs::write(&bad, "[selectors\n").unwrap();
    assert!(load_from(&bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // keep the repo's own config/ out of the way
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) nothing on disk -> built-in defaults
    let d = load_default().unwrap();
    assert_eq!(d.selectors.tables[0], "table.items");

    // 2) JSON fallback in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("goals.json"), r#"{ "source": { "timeout_ms": 1234 } }"#).unwrap();
    assert_eq!(load_default().unwrap().source.timeout_ms, 1234);

    // 3) TOML beats JSON
    fs::write(cfg_dir.join("goals.toml"), "[source]\ntimeout_ms = 4321\n").unwrap();
    assert_eq!(load_default().unwrap().source.timeout_ms, 4321);

    // 4) env path beats both
    let p_env = tmp.path().join("custom.toml");
    fs::write(&p_env, "[source]\ntimeout_ms = 99\n").unwrap();
    env::set_var("GOALS_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_default().unwrap().source.timeout_ms, 99);

    // 5) env path to nowhere is an error, not a silent fallback
    env::set_var("GOALS_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load(None).is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_win_over_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("goals.toml");
    fs::write(
        &p,
        r#"
[source]
url = "https://from-file.test/"
timeout_ms = 5000
"#,
    )
    .unwrap();

    env::set_var("GOALS_SOURCE_URL", "https://from-env.test/");
    env::set_var("GOALS_TIMEOUT_MS", "not-a-number");
    env::set_var("GOALS_ARTIFACT_PATH", "out/Road.astro");
    env::set_var("BROWSERLESS_URL", "https://chrome.example.test");
    env::set_var("BROWSERLESS_TOKEN", "  ");

    let cfg = load(Some(&p)).unwrap();
    assert_eq!(cfg.source.url, "https://from-env.test/");
    // garbage timeout is ignored, file value stays
    assert_eq!(cfg.source.timeout_ms, 5000);
    assert_eq!(cfg.artifact.path, PathBuf::from("out/Road.astro"));
    assert_eq!(
        cfg.source.browserless_url.as_deref(),
        Some("https://chrome.example.test")
    );
    assert_eq!(cfg.source.browserless_token, None);

    clear_env();
}
