use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or a delay range is inverted.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value cannot be parsed or a delay range is inverted.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
        }
    };

    let base_url = or_default("CODETREE_BASE_URL", "https://simplycodes.com")
        .trim_end_matches('/')
        .to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "CODETREE_BASE_URL",
            format!("\"{base_url}\" must start with http:// or https://"),
        ));
    }

    let category_root_path = normalize_root_path(&or_default("CODETREE_CATEGORY_ROOT_PATH", "/category"));
    let data_dir = PathBuf::from(or_default("CODETREE_DATA_DIR", "./data"));
    let log_level = or_default("CODETREE_LOG_LEVEL", "info");
    let headless = parse_bool("CODETREE_HEADLESS", true)?;
    let browser_remote_url = optional("CODETREE_BROWSER_REMOTE_URL");
    let chrome_path = optional("CODETREE_CHROME_PATH").map(PathBuf::from);
    let user_agent = or_default("CODETREE_USER_AGENT", DEFAULT_USER_AGENT);
    let fallback_user_agent = or_default("CODETREE_FALLBACK_USER_AGENT", DEFAULT_FALLBACK_USER_AGENT);

    let nav_timeout_secs = parse_u64("CODETREE_NAV_TIMEOUT_SECS", "30")?;
    if nav_timeout_secs == 0 {
        return Err(invalid("CODETREE_NAV_TIMEOUT_SECS", "must be at least 1".to_string()));
    }
    let max_attempts = parse_u32("CODETREE_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid("CODETREE_MAX_ATTEMPTS", "must be at least 1".to_string()));
    }
    let retry_delay_secs = parse_u64("CODETREE_RETRY_DELAY_SECS", "5")?;
    let category_delay_secs = parse_u64("CODETREE_CATEGORY_DELAY_SECS", "5")?;

    let settle_min_ms = parse_u64("CODETREE_SETTLE_MIN_MS", "2000")?;
    let settle_max_ms = parse_u64("CODETREE_SETTLE_MAX_MS", "4000")?;
    check_range("CODETREE_SETTLE_MIN_MS", "CODETREE_SETTLE_MAX_MS", settle_min_ms, settle_max_ms)?;

    let recovery_min_ms = parse_u64("CODETREE_RECOVERY_MIN_MS", "3000")?;
    let recovery_max_ms = parse_u64("CODETREE_RECOVERY_MAX_MS", "5000")?;
    check_range(
        "CODETREE_RECOVERY_MIN_MS",
        "CODETREE_RECOVERY_MAX_MS",
        recovery_min_ms,
        recovery_max_ms,
    )?;

    Ok(AppConfig {
        base_url,
        category_root_path,
        data_dir,
        log_level,
        headless,
        browser_remote_url,
        chrome_path,
        user_agent,
        fallback_user_agent,
        nav_timeout_secs,
        max_attempts,
        retry_delay_secs,
        category_delay_secs,
        settle_min_ms,
        settle_max_ms,
        recovery_min_ms,
        recovery_max_ms,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Ensures a single leading slash and no trailing slash.
fn normalize_root_path(raw: &str) -> String {
    format!("/{}", raw.trim().trim_matches('/'))
}

fn check_range(min_var: &str, max_var: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvalidRange {
            min_var: min_var.to_string(),
            max_var: max_var.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
