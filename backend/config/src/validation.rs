//! Config validation: deep checks with user-friendly error messages.

use crate::defaults::MAX_WINDOW_HOURS;
use crate::schema::BotConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn require_positive(&mut self, path: &str, value: u64) {
        if value == 0 {
            self.error(path, "must be >= 1");
        }
    }

    fn require_at_most(&mut self, path: &str, value: u64, max: u64) {
        if value > max {
            self.error(path, format!("must be <= {max}"));
        }
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_identity(config, &mut report);
    validate_rate_limit(config, &mut report);
    validate_security(config, &mut report);
    report.require_positive("cleanup.intervalSecs", config.cleanup.interval_secs);
    report
}

fn validate_identity(config: &BotConfig, report: &mut ValidationReport) {
    if config.bot_token.as_deref().map(str::is_empty).unwrap_or(true) {
        report.warn("botToken", "No bot token configured; the bot cannot connect");
    }
    if config.admin_id == 0 {
        report.warn("adminId", "No admin configured; admin-only actions are denied for everyone");
    }
}

fn validate_rate_limit(config: &BotConfig, report: &mut ValidationReport) {
    let rl = &config.rate_limit;
    report.require_positive("rateLimit.maxRequests", rl.max_requests.into());
    report.require_positive("rateLimit.windowHours", rl.window_hours.into());
    report.require_at_most(
        "rateLimit.windowHours",
        rl.window_hours.into(),
        MAX_WINDOW_HOURS.into(),
    );
}

fn validate_security(config: &BotConfig, report: &mut ValidationReport) {
    let sec = &config.security;
    report.require_positive("security.maxMessagesPerMinute", sec.max_messages_per_minute.into());
    report.require_positive("security.maxIdenticalMessages", sec.max_identical_messages.into());
    report.require_positive("security.spamWindowMinutes", sec.spam_window_minutes.into());
    let max_minutes = u64::from(MAX_WINDOW_HOURS) * 60;
    report.require_at_most("security.spamWindowMinutes", sec.spam_window_minutes.into(), max_minutes);
    report.require_at_most(
        "security.trackingRetentionMinutes",
        sec.tracking_retention_minutes.into(),
        max_minutes,
    );
    report.require_positive("security.maxInputLength", sec.max_input_length as u64);
    report.require_positive("security.maxLocationLength", sec.max_location_length as u64);

    // The cleanup pass must never drop history that a live window still counts.
    if sec.tracking_retention_minutes < sec.spam_window_minutes.max(1) {
        report.error(
            "security.trackingRetentionMinutes",
            format!(
                "retention ({}m) must cover the spam window ({}m) and the 1m flood window",
                sec.tracking_retention_minutes, sec.spam_window_minutes
            ),
        );
    }
    if sec.max_location_length > sec.max_input_length {
        report.warn(
            "security.maxLocationLength",
            "longer than maxInputLength; sanitized input is truncated first",
        );
    }
}
