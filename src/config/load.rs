// src/config/load.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::ScraperConfig;

pub const ENV_CONFIG_PATH: &str = "GOALS_CONFIG_PATH";
pub const ENV_SOURCE_URL: &str = "GOALS_SOURCE_URL";
pub const ENV_TIMEOUT_MS: &str = "GOALS_TIMEOUT_MS";
pub const ENV_ARTIFACT_PATH: &str = "GOALS_ARTIFACT_PATH";
pub const ENV_BROWSERLESS_URL: &str = "BROWSERLESS_URL";
pub const ENV_BROWSERLESS_TOKEN: &str = "BROWSERLESS_TOKEN";

pub const DEFAULT_TOML_PATH: &str = "config/goals.toml";
pub const DEFAULT_JSON_PATH: &str = "config/goals.json";

/// Load from an explicit path when given, otherwise fall back to `load_default`.
pub fn load(explicit: Option<&Path>) -> Result<ScraperConfig> {
    match explicit {
        Some(p) => load_from(p),
        None => load_default(),
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<ScraperConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))?;
    finish(&mut cfg);
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $GOALS_CONFIG_PATH
/// 2) config/goals.toml
/// 3) config/goals.json
/// 4) built-in defaults
pub fn load_default() -> Result<ScraperConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_from(&p);
        }
    }
    let mut cfg = ScraperConfig::default();
    finish(&mut cfg);
    Ok(cfg)
}

fn finish(cfg: &mut ScraperConfig) {
    apply_env_overrides(cfg);
    cfg.sanitize();
}

fn parse_config(s: &str, hint_ext: &str) -> Result<ScraperConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<ScraperConfig>(s) {
        Ok(cfg) => Ok(cfg),
        // Unknown extension: give JSON a chance before reporting the TOML error.
        Err(e) if hint_ext != "toml" => serde_json::from_str(s).map_err(|_| anyhow!(e)),
        Err(e) => Err(e.into()),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_timeout_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

fn apply_env_overrides(cfg: &mut ScraperConfig) {
    if let Some(url) = non_empty_env(ENV_SOURCE_URL) {
        cfg.source.url = url;
    }
    if let Some(ms) = parse_timeout_env(std::env::var(ENV_TIMEOUT_MS).ok()) {
        cfg.source.timeout_ms = ms;
    }
    if let Some(path) = non_empty_env(ENV_ARTIFACT_PATH) {
        cfg.artifact.path = PathBuf::from(path);
    }
    if let Some(url) = non_empty_env(ENV_BROWSERLESS_URL) {
        cfg.source.browserless_url = Some(url);
    }
    if let Some(token) = non_empty_env(ENV_BROWSERLESS_TOKEN) {
        cfg.source.browserless_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_sections_override_defaults() {
        let toml = r#"
[source]
url = "https://example.test/goals"
timeout_ms = 5000

[classify]
non_official = ["Exhibition"]

[[goal_types]]
keyword = "volley"
label = "Volley"
"#;
        let cfg = parse_config(toml, "toml").unwrap();
        assert_eq!(cfg.source.url, "https://example.test/goals");
        assert_eq!(cfg.source.timeout_ms, 5000);
        assert_eq!(cfg.classify.non_official, vec!["Exhibition".to_string()]);
        assert_eq!(cfg.goal_types.len(), 1);
        // untouched sections keep defaults
        assert_eq!(cfg.artifact.array_name, "rawData");
        assert!(cfg.teams.contains_key("Juventus FC"));
    }

    #[test]
    fn json_is_accepted() {
        let json = r#"{ "artifact": { "path": "goals.astro", "array_name": "goals" } }"#;
        let cfg = parse_config(json, "json").unwrap();
        assert_eq!(cfg.artifact.path, PathBuf::from("goals.astro"));
        assert_eq!(cfg.artifact.array_name, "goals");
    }

    #[test]
    fn unknown_extension_tries_both() {
        let json = r#"{ "source": { "timeout_ms": 10 } }"#;
        assert_eq!(parse_config(json, "").unwrap().source.timeout_ms, 10);
        assert!(parse_config("not [valid", "").is_err());
    }

    #[test]
    fn timeout_env_rejects_garbage_and_zero() {
        assert_eq!(parse_timeout_env(Some(" 1500 ".into())), Some(1500));
        assert_eq!(parse_timeout_env(Some("0".into())), None);
        assert_eq!(parse_timeout_env(Some("soon".into())), None);
        assert_eq!(parse_timeout_env(None), None);
    }
}
