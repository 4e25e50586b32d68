//! `weatherbot-config` — typed runtime settings for the weather bot.
//!
//! Provides:
//! - Settings schema (rate limit, abuse guard, cleanup, logging)
//! - YAML read/write with atomic replace
//! - Environment overrides and `${ENV_VAR}` substitution
//! - Deep validation, fatal on error
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, EnvOverrideError};
pub use io::{config_dir, config_file_path, load_config, write_config};
pub use redact::redact;
pub use schema::{BotConfig, CleanupConfig, LoggingConfig, RateLimitConfig, SecurityConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load, apply environment overrides, and validate the config at `path`.
///
/// This is the main entry point at startup. Validation errors are fatal.
pub async fn load_and_prepare(path: &Path) -> Result<BotConfig> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// Same as [`load_and_prepare`] with an explicit environment (useful for testing).
pub async fn load_and_prepare_with(path: &Path, env: &HashMap<String, String>) -> Result<BotConfig> {
    let config = load_config(path).await?;
    let config = apply_env_overrides(config, env)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_and_prepare_with(&dir.path().join("config.yaml"), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(cfg.rate_limit.max_requests, defaults::DEFAULT_MAX_REQUESTS);
        assert_eq!(cfg.security.max_messages_per_minute, 10);
    }

    #[tokio::test]
    async fn invalid_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "rateLimit:\n  maxRequests: 0\n").await.unwrap();
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("rateLimit.maxRequests"));
    }

    #[tokio::test]
    async fn env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "adminId: 7\nrateLimit:\n  maxRequests: 5\n").await.unwrap();
        let env: HashMap<String, String> =
            [("RATE_LIMIT_REQUESTS".to_string(), "12".to_string())].into();
        let cfg = load_and_prepare_with(&path, &env).await.unwrap();
        assert_eq!(cfg.admin_id, 7);
        assert_eq!(cfg.rate_limit.max_requests, 12);
    }
}
