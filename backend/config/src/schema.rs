//! Weather bot configuration schema.
//!
//! Typed for serde YAML deserialization. Every section and field has a
//! default, so an empty or missing file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Chat-platform bot token. Usually supplied through `BOT_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Identity allowed to run admin-only actions. 0 disables admin access.
    #[serde(default)]
    pub admin_id: i64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Rate limit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default = "defaults::max_requests")]
    pub max_requests: u32,
    #[serde(default = "defaults::window_hours")]
    pub window_hours: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: defaults::DEFAULT_MAX_REQUESTS,
            window_hours: defaults::DEFAULT_WINDOW_HOURS,
        }
    }
}

// ---------------------------------------------------------------------------
// Abuse guard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityConfig {
    #[serde(default = "defaults::max_messages_per_minute")]
    pub max_messages_per_minute: u32,
    #[serde(default = "defaults::max_identical_messages")]
    pub max_identical_messages: u32,
    #[serde(default = "defaults::spam_window_minutes")]
    pub spam_window_minutes: u32,
    #[serde(default = "defaults::max_input_length")]
    pub max_input_length: usize,
    #[serde(default = "defaults::max_location_length")]
    pub max_location_length: usize,
    #[serde(default = "defaults::tracking_retention_minutes")]
    pub tracking_retention_minutes: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_messages_per_minute: defaults::DEFAULT_MAX_MESSAGES_PER_MINUTE,
            max_identical_messages: defaults::DEFAULT_MAX_IDENTICAL_MESSAGES,
            spam_window_minutes: defaults::DEFAULT_SPAM_WINDOW_MINUTES,
            max_input_length: defaults::DEFAULT_MAX_INPUT_LENGTH,
            max_location_length: defaults::DEFAULT_MAX_LOCATION_LENGTH,
            tracking_retention_minutes: defaults::DEFAULT_TRACKING_RETENTION_MINUTES,
        }
    }
}

// ---------------------------------------------------------------------------
// Cleanup / logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupConfig {
    #[serde(default = "defaults::cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
    /// Directory for the rolling NDJSON log file. Console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            dir: None,
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_all_defaults() {
        let cfg: BotConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, BotConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: BotConfig =
            serde_yaml::from_str("security:\n  maxMessagesPerMinute: 4\n").unwrap();
        assert_eq!(cfg.security.max_messages_per_minute, 4);
        assert_eq!(cfg.security.spam_window_minutes, defaults::DEFAULT_SPAM_WINDOW_MINUTES);
        assert_eq!(cfg.rate_limit, RateLimitConfig::default());
    }
}
