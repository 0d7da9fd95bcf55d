//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BridgeSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use toolbridge_core::logging::LogFormat;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::BridgeSettings;

/// Resolve the default settings file path (`~/.toolbridge/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".toolbridge").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BridgeSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with process env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<BridgeSettings> {
    load_settings_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings from `path`, reading overrides through `env`.
pub fn load_settings_with_env<F>(path: &Path, env: F) -> Result<BridgeSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(BridgeSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: BridgeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, &env);
    settings.validate()?;
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

/// Apply environment variable overrides to loaded settings.
///
/// Variable names follow the deployment conventions of the hosting platform
/// (`PORT`, `ADMIN_TOKEN`, provider tokens). Invalid values are ignored with
/// a warning.
pub fn apply_env_overrides<F>(settings: &mut BridgeSettings, env: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_env_u16(env, "PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_string(env, "HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_string(env, "ADMIN_TOKEN") {
        settings.server.admin_token = Some(v);
    }
    if let Some(v) = read_env_u64(env, "SSE_KEEPALIVE_MS", 1000, 600_000) {
        settings.server.sse_keepalive_ms = v;
    }
    if let Some(v) = read_env_u64(env, "INVOCATION_TIMEOUT_MS", 1000, 3_600_000) {
        settings.server.invocation_timeout_ms = v;
    }
    if let Some(v) = read_env_usize(env, "SUBSCRIBER_BUFFER", 1, 65_536) {
        settings.server.subscriber_buffer = v;
    }

    // ── Guard ───────────────────────────────────────────────────────
    if let Some(v) = read_env_bool(env, "ALLOW_WRITES") {
        settings.guard.allow_writes = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string(env, "LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_string(env, "LOG_FORMAT") {
        match LogFormat::parse(&v) {
            Some(format) => settings.logging.format = format,
            None => tracing::warn!(key = "LOG_FORMAT", value = %v, "invalid log format, ignoring"),
        }
    }

    // ── Upstream credentials ────────────────────────────────────────
    let upstream = &mut settings.upstream;
    if let Some(v) = read_env_string(env, "DISCORD_BOT_TOKEN") {
        upstream.discord.bot_token = Some(v);
    }
    if let Some(v) = read_env_string(env, "DISCORD_CHANNEL_ID") {
        upstream.discord.default_channel_id = Some(v);
    }
    if let Some(v) = read_env_string(env, "GITHUB_TOKEN") {
        upstream.github.token = Some(v);
    }
    if let Some(v) = read_env_string(env, "RAILWAY_TOKEN") {
        upstream.railway.token = Some(v);
    }
    if let Some(v) = read_env_string(env, "DOCKERHUB_TOKEN") {
        upstream.dockerhub.token = Some(v);
    }
    if let Some(v) = read_env_string(env, "DOCKER_HOST") {
        upstream.docker.engine_url = Some(v);
    }
    if let Some(v) = read_env_string(env, "OPENAI_API_KEY") {
        upstream.llm.openai_api_key = Some(v);
    }
    if let Some(v) = read_env_string(env, "ANTHROPIC_API_KEY") {
        upstream.llm.anthropic_api_key = Some(v);
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string<F>(env: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(name).filter(|v| !v.is_empty())
}

fn read_env_bool<F>(env: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let val = env(name)?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u16<F>(env: &F, name: &str, min: u16, max: u16) -> Option<u16>
where
    F: Fn(&str) -> Option<String>,
{
    let val = env(name)?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u64<F>(env: &F, name: &str, min: u64, max: u64) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let val = env(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize<F>(env: &F, name: &str, min: usize, max: usize) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let val = env(name)?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
