use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::DEFAULT_API_BASE_URL;
use serde::Deserialize;
use tracing::warn;
use url::Url;
use workflow::WorkflowConfig;

pub const DEFAULT_CONFIG_PATH: &str = "checker.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub processing_hint_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: 60,
            processing_hint_ms: 1500,
        }
    }
}

impl Settings {
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            call_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            processing_hint: Duration::from_millis(self.processing_hint_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    processing_hint_ms: Option<u64>,
}

pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os("CHECKER_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the optional config file, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        if let Some(v) = file_cfg.api_base_url {
            settings.api_base_url = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            settings.request_timeout_secs = v;
        }
        if let Some(v) = file_cfg.processing_hint_ms {
            settings.processing_hint_ms = v;
        }
    }

    if let Some(v) = env("RECEIPT_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(err) => warn!(value = %v, %err, "ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }
    if let Some(v) = env("APP__PROCESSING_HINT_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.processing_hint_ms = parsed,
            Err(err) => warn!(value = %v, %err, "ignoring invalid APP__PROCESSING_HINT_MS"),
        }
    }

    settings.api_base_url = prepare_api_base_url(&settings.api_base_url)?;
    Ok(settings)
}

pub fn prepare_api_base_url(raw_api_base_url: &str) -> anyhow::Result<String> {
    let raw_api_base_url = raw_api_base_url.trim();
    if raw_api_base_url.is_empty() {
        return Ok(Settings::default().api_base_url);
    }

    let parsed = Url::parse(raw_api_base_url)
        .with_context(|| format!("invalid api base url '{raw_api_base_url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "api base url '{raw_api_base_url}' must use http or https, not '{}'",
            parsed.scheme()
        );
    }

    Ok(raw_api_base_url.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
