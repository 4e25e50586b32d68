//! Default values for every tunable setting.

/// Weather lookups permitted per user per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 20;

/// Rate-limit window length in hours.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Longest accepted window, one year. Also bounds the minute-based windows.
pub const MAX_WINDOW_HOURS: u32 = 24 * 365;

pub const DEFAULT_MAX_MESSAGES_PER_MINUTE: u32 = 10;

/// Identical messages tolerated inside the spam window.
pub const DEFAULT_MAX_IDENTICAL_MESSAGES: u32 = 3;

pub const DEFAULT_SPAM_WINDOW_MINUTES: u32 = 5;

/// Sanitized free text is cut to this many characters.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 1000;

pub const DEFAULT_MAX_LOCATION_LENGTH: usize = 100;

/// Flood and spam history older than this is dropped by the cleanup pass.
pub const DEFAULT_TRACKING_RETENTION_MINUTES: u32 = 60;

pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub(crate) fn max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

pub(crate) fn window_hours() -> u32 {
    DEFAULT_WINDOW_HOURS
}

pub(crate) fn max_messages_per_minute() -> u32 {
    DEFAULT_MAX_MESSAGES_PER_MINUTE
}

pub(crate) fn max_identical_messages() -> u32 {
    DEFAULT_MAX_IDENTICAL_MESSAGES
}

pub(crate) fn spam_window_minutes() -> u32 {
    DEFAULT_SPAM_WINDOW_MINUTES
}

pub(crate) fn max_input_length() -> usize {
    DEFAULT_MAX_INPUT_LENGTH
}

pub(crate) fn max_location_length() -> usize {
    DEFAULT_MAX_LOCATION_LENGTH
}

pub(crate) fn tracking_retention_minutes() -> u32 {
    DEFAULT_TRACKING_RETENTION_MINUTES
}

pub(crate) fn cleanup_interval_secs() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_SECS
}

pub(crate) fn log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
