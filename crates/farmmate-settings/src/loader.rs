//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FarmmateSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::FarmmateSettings;

/// Resolve the path to the settings file (`~/.farmmate/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".farmmate").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FarmmateSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or an invalid merged value is
/// an error.
pub fn load_settings_from_path(path: &Path) -> Result<FarmmateSettings> {
    load_with(path, env_lookup)
}

/// Load settings from `path`, resolving overrides through `lookup`.
pub fn load_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<FarmmateSettings> {
    let defaults = serde_json::to_value(FarmmateSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FarmmateSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, lookup);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut FarmmateSettings) {
    apply_overrides(settings, env_lookup);
}

/// Apply overrides resolved through `lookup`.
///
/// Invalid values are logged and ignored, leaving the file or default value.
pub fn apply_overrides(settings: &mut FarmmateSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("FARMMATE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("FARMMATE_PORT") {
        if let Some(port) = checked("FARMMATE_PORT", &v, |v| parse_u16_range(v, 1, 65535)) {
            settings.server.port = port;
        }
    }
    if let Some(v) = read("FARMMATE_ALLOWED_ORIGINS") {
        let origins = parse_list(&v);
        if origins.is_empty() {
            warn!(key = "FARMMATE_ALLOWED_ORIGINS", value = %v, "no origins in env var, ignoring");
        } else {
            settings.server.allowed_origins = origins;
        }
    }

    // ── Backend ─────────────────────────────────────────────────────
    if let Some(v) = read("PYTHON_SERVER_URL") {
        settings.backend.url = v;
    }
    if let Some(v) = read("FARMMATE_CONNECT_TIMEOUT_MS") {
        if let Some(ms) = checked("FARMMATE_CONNECT_TIMEOUT_MS", &v, |v| {
            parse_u64_range(v, 100, 600_000)
        }) {
            settings.backend.connect_timeout_ms = ms;
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("FARMMATE_LOG_JSON") {
        if let Some(json) = checked("FARMMATE_LOG_JSON", &v, parse_bool) {
            settings.logging.json = json;
        }
    }
    if let Some(v) = read("FARMMATE_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Reject merged settings the gateway cannot run with.
pub fn validate(settings: &FarmmateSettings) -> Result<()> {
    let invalid = |msg: &str| Err(SettingsError::InvalidValue(msg.to_string()));

    if settings.server.port == 0 {
        return invalid("server.port must be non-zero");
    }
    if settings.server.heartbeat_interval_ms == 0 {
        return invalid("server.heartbeatIntervalMs must be non-zero");
    }
    if settings.server.pong_timeout_ms < settings.server.heartbeat_interval_ms {
        return invalid("server.pongTimeoutMs must be at least server.heartbeatIntervalMs");
    }
    if settings.server.send_queue == 0 || settings.backend.queue == 0 {
        return invalid("queue sizes must be non-zero");
    }
    if settings.server.max_message_bytes == 0 {
        return invalid("server.maxMessageBytes must be non-zero");
    }
    if !(settings.backend.url.starts_with("ws://") || settings.backend.url.starts_with("wss://")) {
        return Err(SettingsError::InvalidValue(format!(
            "backend.url must be a ws:// or wss:// URL, got {}",
            settings.backend.url
        )));
    }
    if settings.backend.connect_timeout_ms == 0 {
        return invalid("backend.connectTimeoutMs must be non-zero");
    }
    Ok(())
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn checked<T>(name: &str, raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let result = parse(raw);
    if result.is_none() {
        warn!(key = name, value = %raw, "invalid env var, ignoring");
    }
    result
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
