//! Config inspection commands.

use std::path::Path;

use anyhow::{bail, Result};
use serde_json::json;
use weatherbot_config::{redact, write_config, BotConfig};

pub async fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    write_config(&BotConfig::default(), path).await?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn check(config: &BotConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&redact(config))?);
    Ok(())
}

pub fn limits(config: &BotConfig) -> Result<()> {
    let sec = &config.security;
    let report = json!({
        "rateLimit": {
            "maxRequests": config.rate_limit.max_requests,
            "windowHours": config.rate_limit.window_hours,
        },
        "flood": { "maxMessagesPerMinute": sec.max_messages_per_minute },
        "spam": {
            "maxIdenticalMessages": sec.max_identical_messages,
            "windowMinutes": sec.spam_window_minutes,
        },
        "input": {
            "maxInputLength": sec.max_input_length,
            "maxLocationLength": sec.max_location_length,
        },
        "adminConfigured": config.admin_id != 0,
        "cleanupIntervalSecs": config.cleanup.interval_secs,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
