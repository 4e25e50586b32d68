//! Config redaction: safe-to-display snapshots with secrets masked.

use serde_json::Value;

use crate::schema::BotConfig;

static SENSITIVE_KEYS: &[&str] = &["botToken", "bot_token", "token", "secret", "password"];

/// Serialize `config` with every sensitive string replaced by a short hint.
pub fn redact(config: &BotConfig) -> Value {
    let mut value = serde_json::to_value(config).unwrap_or(Value::Null);
    redact_recursive(&mut value);
    value
}

fn redact_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let sensitive = SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key));
                match child {
                    Value::String(s) if sensitive => *s = mask(s),
                    other => redact_recursive(other),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_recursive),
        _ => {}
    }
}

fn mask(s: &str) -> String {
    // Chat tokens start with the numeric bot id, which is not secret.
    match s.split_once(':') {
        Some((bot_id, _)) if bot_id.chars().all(|c| c.is_ascii_digit()) => format!("{bot_id}:***"),
        _ => "***".to_string(),
    }
}
