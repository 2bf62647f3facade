use std::collections::HashMap;
use std::env::VarError;
use std::path::PathBuf;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.base_url, "https://simplycodes.com");
    assert_eq!(cfg.category_root_path, "/category");
    assert_eq!(cfg.data_dir, PathBuf::from("./data"));
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.headless);
    assert!(cfg.browser_remote_url.is_none());
    assert!(cfg.chrome_path.is_none());
    assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
    assert_eq!(cfg.fallback_user_agent, DEFAULT_FALLBACK_USER_AGENT);
    assert_eq!(cfg.nav_timeout_secs, 30);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.retry_delay_secs, 5);
    assert_eq!(cfg.category_delay_secs, 5);
    assert_eq!((cfg.settle_min_ms, cfg.settle_max_ms), (2000, 4000));
    assert_eq!((cfg.recovery_min_ms, cfg.recovery_max_ms), (3000, 5000));
}

#[test]
fn default_user_agents_differ() {
    assert_ne!(DEFAULT_USER_AGENT, DEFAULT_FALLBACK_USER_AGENT);
    assert!(DEFAULT_FALLBACK_USER_AGENT.contains("Windows"));
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = HashMap::new();
    map.insert("CODETREE_BASE_URL", "http://localhost:8080/");
    map.insert("CODETREE_CATEGORY_ROOT_PATH", "categories/");
    map.insert("CODETREE_DATA_DIR", "/tmp/codetree");
    map.insert("CODETREE_HEADLESS", "false");
    map.insert("CODETREE_BROWSER_REMOTE_URL", "http://127.0.0.1:9222");
    map.insert("CODETREE_MAX_ATTEMPTS", "5");
    map.insert("CODETREE_NAV_TIMEOUT_SECS", "45");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    assert_eq!(cfg.base_url, "http://localhost:8080");
    assert_eq!(cfg.category_root_path, "/categories");
    assert_eq!(cfg.data_dir, PathBuf::from("/tmp/codetree"));
    assert!(!cfg.headless);
    assert_eq!(
        cfg.browser_remote_url.as_deref(),
        Some("http://127.0.0.1:9222")
    );
    assert_eq!(cfg.max_attempts, 5);
    assert_eq!(cfg.nav_timeout_secs, 45);
    assert_eq!(cfg.category_root_url(), "http://localhost:8080/categories");
}

#[test]
fn blank_optional_values_are_treated_as_unset() {
    let mut map = HashMap::new();
    map.insert("CODETREE_BROWSER_REMOTE_URL", "  ");
    map.insert("CODETREE_CHROME_PATH", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.browser_remote_url.is_none());
    assert!(cfg.chrome_path.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_headless_flag() {
    let mut map = HashMap::new();
    map.insert("CODETREE_HEADLESS", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CODETREE_HEADLESS"),
        "expected InvalidEnvVar(CODETREE_HEADLESS), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_non_numeric_timeout() {
    let mut map = HashMap::new();
    map.insert("CODETREE_NAV_TIMEOUT_SECS", "thirty");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CODETREE_NAV_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CODETREE_NAV_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_attempts() {
    let mut map = HashMap::new();
    map.insert("CODETREE_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CODETREE_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(CODETREE_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_nav_timeout() {
    let mut map = HashMap::new();
    map.insert("CODETREE_NAV_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CODETREE_NAV_TIMEOUT_SECS"),
        "expected InvalidEnvVar(CODETREE_NAV_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_base_url_without_scheme() {
    let mut map = HashMap::new();
    map.insert("CODETREE_BASE_URL", "simplycodes.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CODETREE_BASE_URL"
    ));
}

#[test]
fn build_app_config_rejects_inverted_settle_range() {
    let mut map = HashMap::new();
    map.insert("CODETREE_SETTLE_MIN_MS", "5000");
    map.insert("CODETREE_SETTLE_MAX_MS", "1000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(
            result,
            Err(ConfigError::InvalidRange { ref min_var, min: 5000, max: 1000, .. })
                if min_var == "CODETREE_SETTLE_MIN_MS"
        ),
        "expected InvalidRange for settle delay, got: {result:?}"
    );
}

#[test]
fn equal_range_bounds_are_accepted() {
    let mut map = HashMap::new();
    map.insert("CODETREE_RECOVERY_MIN_MS", "0");
    map.insert("CODETREE_RECOVERY_MAX_MS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!((cfg.recovery_min_ms, cfg.recovery_max_ms), (0, 0));
}

#[test]
fn category_root_url_joins_base_and_root_path() {
    let mut map = HashMap::new();
    map.insert("CODETREE_CATEGORY_ROOT_PATH", "categories/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.category_root_url(), "https://simplycodes.com/categories");
}

#[test]
fn parse_flag_accepts_common_spellings() {
    assert_eq!(parse_flag("TRUE"), Some(true));
    assert_eq!(parse_flag(" 0 "), Some(false));
    assert_eq!(parse_flag("off"), Some(false));
    assert_eq!(parse_flag("nope"), None);
}
