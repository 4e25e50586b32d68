//! Environment overrides for config values.
//!
//! Recognised variables take precedence over the YAML file:
//! `BOT_TOKEN`, `ADMIN_ID`, `RATE_LIMIT_REQUESTS`, `RATE_LIMIT_WINDOW_HOURS`,
//! `WEATHERBOT_LOG_LEVEL`.
//!
//! String values in the file may also reference variables as `${VAR_NAME}`
//! (uppercase names only), resolved at load time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

use crate::schema::BotConfig;

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum EnvOverrideError {
    #[error("Env var \"{var_name}\" has non-numeric value \"{value}\"")]
    NotANumber { var_name: String, value: String },

    #[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
    Missing { var_name: String, config_path: String },
}

/// Apply overrides and `${VAR}` substitution from `env` to `config`.
pub fn apply_env_overrides(
    mut config: BotConfig,
    env: &HashMap<String, String>,
) -> Result<BotConfig, EnvOverrideError> {
    if let Some(token) = &config.bot_token {
        config.bot_token = Some(substitute(token, env, "botToken")?);
    }
    if let Some(dir) = &config.logging.dir {
        config.logging.dir = Some(substitute(dir, env, "logging.dir")?);
    }

    if let Some(token) = non_empty(env, "BOT_TOKEN") {
        config.bot_token = Some(token.to_string());
    }
    if let Some(admin) = parse_var(env, "ADMIN_ID")? {
        config.admin_id = admin;
    }
    if let Some(max) = parse_var(env, "RATE_LIMIT_REQUESTS")? {
        config.rate_limit.max_requests = max;
    }
    if let Some(hours) = parse_var(env, "RATE_LIMIT_WINDOW_HOURS")? {
        config.rate_limit.window_hours = hours;
    }
    if let Some(level) = non_empty(env, "WEATHERBOT_LOG_LEVEL") {
        config.logging.level = level.to_string();
    }

    Ok(config)
}

fn non_empty<'a>(env: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(
    env: &HashMap<String, String>,
    name: &str,
) -> Result<Option<T>, EnvOverrideError> {
    let Some(raw) = non_empty(env, name) else {
        return Ok(None);
    };
    raw.parse().map(Some).map_err(|_| EnvOverrideError::NotANumber {
        var_name: name.to_string(),
        value: raw.to_string(),
    })
}

fn substitute(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, EnvOverrideError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let out = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        match env.get(&caps[1]).filter(|v| !v.is_empty()) {
            Some(val) => val.clone(),
            None => {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(EnvOverrideError::Missing {
            var_name,
            config_path: path.to_string(),
        }),
        None => Ok(out.into_owned()),
    }
}
