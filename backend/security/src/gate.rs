//! Single admission decision for every inbound user action.
//!
//! Order: permissions (block list, flood, admin-only) → repeated-message check
//! → payload validation → rate limit. Validation runs before the rate limit
//! so malformed input never spends a lookup slot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use weatherbot_config::BotConfig;
use weatherbot_core::{Action, Clock, Denial, UserId};
use weatherbot_logging::{log_security_event, SecurityEventKind};

use crate::guard::AbuseGuard;
use crate::rate_limiter::RateLimiter;

/// What came with the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    #[default]
    None,
    Text {
        text: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
    },
    /// Inline-keyboard button data.
    Callback {
        data: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    pub user_id: UserId,
    pub action: Action,
    #[serde(default)]
    pub payload: Payload,
}

impl InboundRequest {
    pub fn text(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            action: Action::TextMessage,
            payload: Payload::Text { text: text.into() },
        }
    }

    pub fn location(user_id: UserId, latitude: f64, longitude: f64) -> Self {
        Self {
            user_id,
            action: Action::LocationMessage,
            payload: Payload::Location { latitude, longitude },
        }
    }

    pub fn callback(user_id: UserId, data: impl Into<String>) -> Self {
        Self {
            user_id,
            action: Action::Callback,
            payload: Payload::Callback { data: data.into() },
        }
    }

    pub fn command(user_id: UserId, action: Action) -> Self {
        Self {
            user_id,
            action,
            payload: Payload::None,
        }
    }
}

/// An admitted request, ready for the handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// Effective action; a keyboard-button text resolves to its command.
    pub action: Action,
    /// Sanitized location text for text lookups.
    pub sanitized_text: Option<String>,
    /// Lookups left after this one, for weather lookups only.
    pub remaining_requests: Option<u32>,
}

impl Admission {
    fn unmetered(action: Action) -> Self {
        Self {
            action,
            sanitized_text: None,
            remaining_requests: None,
        }
    }
}

pub struct RequestGate {
    guard: AbuseGuard,
    limiter: RateLimiter,
}

impl RequestGate {
    pub fn new(guard: AbuseGuard, limiter: RateLimiter) -> Self {
        Self { guard, limiter }
    }

    pub fn from_config(config: &BotConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            AbuseGuard::from_config(&config.security, config.admin_id, clock.clone()),
            RateLimiter::from_config(&config.rate_limit, clock),
        )
    }

    pub fn guard(&self) -> &AbuseGuard {
        &self.guard
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub async fn admit(&self, request: &InboundRequest) -> Result<Admission, Denial> {
        let user_id = request.user_id;
        self.guard.authorize(user_id, request.action).await?;

        let action = resolve_button(request);
        if !action.is_weather_lookup() {
            return Ok(Admission::unmetered(action));
        }

        let sanitized_text = match &request.payload {
            Payload::Text { text } => {
                if !self.guard.check_spam(user_id, text).await {
                    return Err(Denial::SpamDetected);
                }
                let sanitized = self.guard.sanitize(text);
                if !self.guard.validate_location(&sanitized) {
                    return Err(reject(user_id, Denial::InvalidInput, text));
                }
                Some(sanitized)
            }
            Payload::Location { latitude, longitude } => {
                if !self.guard.validate_coordinates(*latitude, *longitude) {
                    let details = format!("lat={latitude} lon={longitude}");
                    return Err(reject(user_id, Denial::InvalidCoordinates, &details));
                }
                None
            }
            Payload::Callback { data } => match parse_callback(data) {
                CallbackTarget::Menu => return Ok(Admission::unmetered(action)),
                CallbackTarget::Malformed => {
                    return Err(reject(user_id, Denial::InvalidInput, data));
                }
                CallbackTarget::Lookup { latitude, longitude } => {
                    if !self.guard.validate_coordinates(latitude, longitude) {
                        return Err(reject(user_id, Denial::InvalidCoordinates, data));
                    }
                    None
                }
            },
            // Menu buttons (back, settings, donate) may arrive without their data.
            Payload::None if action == Action::Callback => {
                return Ok(Admission::unmetered(action));
            }
            Payload::None => {
                return Err(reject(user_id, Denial::InvalidInput, "missing payload"));
            }
        };

        if !self.limiter.check(user_id).await {
            let denial = Denial::RateLimited {
                reset_at: self.limiter.reset_time(user_id).await,
            };
            return Err(reject(user_id, denial, "weather lookup limit reached"));
        }

        Ok(Admission {
            action,
            sanitized_text,
            remaining_requests: Some(self.limiter.remaining(user_id).await),
        })
    }

    /// Run both cleanup passes. Returns how many tracker keys were evicted.
    pub async fn cleanup(&self) -> usize {
        self.limiter.cleanup().await + self.guard.cleanup_tracking().await
    }
}

fn reject(user_id: UserId, denial: Denial, details: &str) -> Denial {
    log_security_event(user_id, SecurityEventKind::from(&denial), details);
    denial
}

/// Button-data prefixes that repeat a lookup for `{lat}_{lon}`.
const LOOKUP_CALLBACK_PREFIXES: [&str; 3] = ["refresh_", "forecast_", "current_"];

#[derive(Debug, PartialEq)]
enum CallbackTarget {
    Lookup { latitude: f64, longitude: f64 },
    Malformed,
    Menu,
}

fn parse_callback(data: &str) -> CallbackTarget {
    let Some(coords) = LOOKUP_CALLBACK_PREFIXES
        .iter()
        .find_map(|prefix| data.strip_prefix(prefix))
    else {
        return CallbackTarget::Menu;
    };
    let parsed = coords.split_once('_').and_then(|(lat, lon)| {
        Some((lat.parse::<f64>().ok()?, lon.parse::<f64>().ok()?))
    });
    match parsed {
        Some((latitude, longitude)) => CallbackTarget::Lookup { latitude, longitude },
        None => CallbackTarget::Malformed,
    }
}

/// Reply-keyboard buttons arrive as plain text messages.
fn resolve_button(request: &InboundRequest) -> Action {
    let Payload::Text { text } = &request.payload else {
        return request.action;
    };
    if request.action != Action::TextMessage {
        return request.action;
    }
    let label = text
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
        .trim();
    match label {
        "Help" => Action::Help,
        "Donate" => Action::Donate,
        "Settings" => Action::Settings,
        _ => request.action,
    }
}
