use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque chat-platform user identifier. Every rate and abuse counter is keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Kind of inbound action a user performs against the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Help,
    Donate,
    Settings,
    TextMessage,
    LocationMessage,
    Callback,
    Stats,
    Users,
    AdminCallback,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Start,
        Action::Help,
        Action::Donate,
        Action::Settings,
        Action::TextMessage,
        Action::LocationMessage,
        Action::Callback,
        Action::Stats,
        Action::Users,
        Action::AdminCallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Help => "help",
            Action::Donate => "donate",
            Action::Settings => "settings",
            Action::TextMessage => "text_message",
            Action::LocationMessage => "location_message",
            Action::Callback => "callback",
            Action::Stats => "stats",
            Action::Users => "users",
            Action::AdminCallback => "admin_callback",
        }
    }

    /// Actions reserved for the configured admin identity.
    pub fn is_admin_only(&self) -> bool {
        matches!(self, Action::Stats | Action::Users | Action::AdminCallback)
    }

    /// Actions that end in a weather lookup and therefore count against the rate limit.
    pub fn is_weather_lookup(&self) -> bool {
        matches!(
            self,
            Action::TextMessage | Action::LocationMessage | Action::Callback
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}
