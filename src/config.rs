//! Startup configuration from the environment

use crate::resolver::DEFAULT_LATENCY;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Emulated latency of the canned resolver
    pub reply_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            reply_delay: DEFAULT_LATENCY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_setting("BCEAO_PORT", &lookup).unwrap_or(defaults.port),
            reply_delay: parse_setting("BCEAO_REPLY_DELAY_MS", &lookup)
                .map_or(defaults.reply_delay, Duration::from_millis),
        }
    }
}

fn parse_setting<T: FromStr>(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<T> {
    let raw = lookup(key)?;
    if let Ok(value) = raw.trim().parse() {
        Some(value)
    } else {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
        None
    }
}
