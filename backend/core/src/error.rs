use chrono::{DateTime, Utc};
use thiserror::Error;

/// Reason an inbound action was refused.
///
/// Denials are ordinary outcomes: the caller replies with
/// [`Denial::user_message`] and drops the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Denial {
    #[error("rate limit reached; resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("user is blocked")]
    Blocked,

    #[error("flood detected")]
    FloodDetected,

    #[error("repeated identical messages")]
    SpamDetected,

    #[error("admin-only action")]
    UnauthorizedAdmin,

    #[error("invalid location input")]
    InvalidInput,

    #[error("invalid coordinates")]
    InvalidCoordinates,
}

impl Denial {
    /// Security-event tag recorded in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Denial::RateLimited { .. } => "RATE_LIMITED",
            Denial::Blocked => "BLOCKED_USER_ACCESS",
            Denial::FloodDetected => "FLOOD_DETECTED",
            Denial::SpamDetected => "SPAM_DETECTED",
            Denial::UnauthorizedAdmin => "UNAUTHORIZED_ADMIN_ACCESS",
            Denial::InvalidInput => "INVALID_INPUT",
            Denial::InvalidCoordinates => "INVALID_COORDINATES",
        }
    }

    /// Reply text sent back to the user.
    pub fn user_message(&self, now: DateTime<Utc>) -> String {
        match self {
            Denial::Blocked
            | Denial::FloodDetected
            | Denial::SpamDetected
            | Denial::UnauthorizedAdmin => "⚠️ Access denied. Please try again later or contact \
                 support if you believe this is an error."
                .to_string(),
            Denial::InvalidInput => {
                "❌ Invalid location format. Please enter a valid city or location name."
                    .to_string()
            }
            Denial::InvalidCoordinates => {
                "❌ Invalid location coordinates. Please try sharing your location again."
                    .to_string()
            }
            Denial::RateLimited { reset_at } => {
                let wait = (*reset_at - now).max(chrono::Duration::zero());
                let hours = wait.num_hours();
                let minutes = wait.num_minutes() - hours * 60;
                format!(
                    "⚠️ You've reached your weather request limit. It resets in {hours}h {minutes}m."
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn rate_limit_message_shows_remaining_wait() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let denial = Denial::RateLimited {
            reset_at: now + Duration::minutes(185),
        };
        assert!(denial.user_message(now).contains("3h 5m"));
    }

    #[test]
    fn past_reset_clamps_to_zero() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let denial = Denial::RateLimited {
            reset_at: now - Duration::minutes(5),
        };
        assert!(denial.user_message(now).contains("0h 0m"));
    }

    #[test]
    fn abuse_denials_share_access_denied_reply() {
        let now = Utc::now();
        let blocked = Denial::Blocked.user_message(now);
        assert_eq!(blocked, Denial::FloodDetected.user_message(now));
        assert!(blocked.contains("Access denied"));
        assert_eq!(Denial::UnauthorizedAdmin.kind(), "UNAUTHORIZED_ADMIN_ACCESS");
    }
}
