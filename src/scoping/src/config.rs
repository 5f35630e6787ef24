//! Scoping engine configuration
//!
//! Environment variables read by [`ScopingConfig::from_env`]:
//! - `SCOPING_BINDING_CACHE` - cache inferred association bindings (default: true)
//! - `SCOPING_VALIDATE_KEYWORDS` - reject keywords a scopable does not offer (default: false)
//! - `SCOPING_METRICS` - collect evaluation metrics (default: true)

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Result, ScopingError};

pub const ENV_BINDING_CACHE: &str = "SCOPING_BINDING_CACHE";
pub const ENV_VALIDATE_KEYWORDS: &str = "SCOPING_VALIDATE_KEYWORDS";
pub const ENV_METRICS: &str = "SCOPING_METRICS";

/// Scoping engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopingConfig {
    /// Cache inferred association bindings for the process lifetime
    pub enable_binding_cache: bool,

    /// Check keywords against `available_keywords` before resolving them
    pub validate_keywords: bool,

    /// Collect evaluation metrics
    pub enable_metrics: bool,
}

impl Default for ScopingConfig {
    fn default() -> Self {
        Self {
            enable_binding_cache: true,
            validate_keywords: false,
            enable_metrics: true,
        }
    }
}

impl ScopingConfig {
    /// Defaults overridden by `SCOPING_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enable_binding_cache: env_flag(ENV_BINDING_CACHE, defaults.enable_binding_cache)?,
            validate_keywords: env_flag(ENV_VALIDATE_KEYWORDS, defaults.validate_keywords)?,
            enable_metrics: env_flag(ENV_METRICS, defaults.enable_metrics)?,
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_flag(&value).ok_or_else(|| {
            ScopingError::InvalidInput(format!("{name} must be a boolean, got '{value}'"))
        }),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(env::VarError::NotUnicode(_)) => Err(ScopingError::InvalidInput(format!(
            "{name} is not valid unicode"
        ))),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
