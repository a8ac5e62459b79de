use chrono::FixedOffset;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Kept separate from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let sheet_url = require("COWFUEL_SHEET_URL")?;
    if !(sheet_url.starts_with("http://") || sheet_url.starts_with("https://")) {
        return Err(invalid(
            "COWFUEL_SHEET_URL",
            "expected an http(s) URL".to_string(),
        ));
    }

    let env = parse_environment(&or_default("COWFUEL_ENV", "development"));

    let bind_addr = or_default("COWFUEL_BIND_ADDR", "0.0.0.0:8080")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("COWFUEL_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("COWFUEL_LOG_LEVEL", "info");

    let cache_ttl_secs = parse_u64("COWFUEL_CACHE_TTL_SECS", "300")?;
    let fetch_timeout_secs = parse_u64("COWFUEL_FETCH_TIMEOUT_SECS", "10")?;
    if fetch_timeout_secs == 0 {
        return Err(invalid(
            "COWFUEL_FETCH_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let max_redirects = parse_usize("COWFUEL_MAX_REDIRECTS", "5")?;
    let user_agent = or_default("COWFUEL_USER_AGENT", "cowfuel/0.1 (fuel-dashboard)");

    let utc_offset = match lookup("COWFUEL_UTC_OFFSET") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            parse_utc_offset(&raw).ok_or_else(|| {
                invalid(
                    "COWFUEL_UTC_OFFSET",
                    format!("expected an offset like +03:00, got \"{raw}\""),
                )
            })?,
        ),
        _ => None,
    };

    let warm_cron = Some(or_default("COWFUEL_WARM_CRON", "0 */5 * * * *"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(AppConfig {
        sheet_url,
        env,
        bind_addr,
        log_level,
        cache_ttl_secs,
        fetch_timeout_secs,
        max_redirects,
        user_agent,
        utc_offset,
        warm_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Parses `Z`, `UTC`, `+HH`, `+HH:MM` or `+HHMM` (and the `-` forms).
#[must_use]
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
