// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator configuration: TOML file plus environment overrides.

use serde::{Deserialize, Serialize};
use sqk_core::Severity;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not determine a state directory")]
    NoStateDir,
}

/// LLM planner settings. The provider itself is an external capability;
/// these are handed to whatever transport implements it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { api_key: None, model: None, timeout_ms: 60_000 }
    }
}

/// All recognized options, with the documented defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Storage root; everything durable lives under it.
    pub datadir: PathBuf,
    pub llm: LlmConfig,
    pub reaper_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub heartbeat_timeout_ms: u64,
    pub checkpoint_retention_days: u32,
    /// Retention for the external metrics exporter.
    pub metrics_retention_days: u32,
    /// Retention for the external alerting exporter.
    pub alert_retention_days: u32,
    pub autoresolve_threshold: Severity,
    pub conflict_retention_days: u32,
    /// Port the external HTTP transport binds.
    pub port: u16,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            datadir: PathBuf::new(),
            llm: LlmConfig::default(),
            reaper_interval_ms: 5_000,
            heartbeat_interval_ms: 15_000,
            heartbeat_timeout_ms: 45_000,
            checkpoint_retention_days: 7,
            metrics_retention_days: 7,
            alert_retention_days: 30,
            autoresolve_threshold: Severity::Medium,
            conflict_retention_days: 7,
            port: 7411,
        }
    }
}

impl CoordinatorConfig {
    /// Load from an optional TOML file, then apply environment overrides,
    /// then fill the datadir default.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) if path.exists() => {
                toml::from_str(&std::fs::read_to_string(path)?)?
            }
            _ => Self::default(),
        };

        if let Ok(dir) = std::env::var("SQUAWK_DATA_DIR") {
            config.datadir = PathBuf::from(dir);
        }
        if let Ok(key) = std::env::var("SQUAWK_LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("SQUAWK_LLM_MODEL") {
            config.llm.model = Some(model);
        }
        if let Ok(port) = std::env::var("SQUAWK_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }

        if config.datadir.as_os_str().is_empty() {
            config.datadir = default_datadir()?;
        }
        Ok(config)
    }

    pub fn checkpoint_retention_ms(&self) -> u64 {
        days_to_ms(self.checkpoint_retention_days)
    }

    pub fn conflict_retention_ms(&self) -> u64 {
        days_to_ms(self.conflict_retention_days)
    }
}

fn days_to_ms(days: u32) -> u64 {
    days as u64 * 24 * 60 * 60 * 1000
}

/// `$XDG_STATE_HOME/squawk` or `~/.local/state/squawk`.
fn default_datadir() -> Result<PathBuf, ConfigError> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        if !state_home.is_empty() {
            return Ok(PathBuf::from(state_home).join("squawk"));
        }
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local").join("state").join("squawk"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
