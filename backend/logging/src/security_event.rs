//! Security events: one structured warning record per guard decision worth auditing.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use weatherbot_core::{Denial, UserId};

use crate::redact::clip_user_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEventKind {
    BlockedUserAccess,
    FloodDetected,
    SpamDetected,
    UnauthorizedAdminAccess,
    InvalidInput,
    InvalidCoordinates,
    RateLimited,
    UserBlocked,
    UserUnblocked,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventKind::BlockedUserAccess => "BLOCKED_USER_ACCESS",
            SecurityEventKind::FloodDetected => "FLOOD_DETECTED",
            SecurityEventKind::SpamDetected => "SPAM_DETECTED",
            SecurityEventKind::UnauthorizedAdminAccess => "UNAUTHORIZED_ADMIN_ACCESS",
            SecurityEventKind::InvalidInput => "INVALID_INPUT",
            SecurityEventKind::InvalidCoordinates => "INVALID_COORDINATES",
            SecurityEventKind::RateLimited => "RATE_LIMITED",
            SecurityEventKind::UserBlocked => "USER_BLOCKED",
            SecurityEventKind::UserUnblocked => "USER_UNBLOCKED",
        }
    }

    /// Unblocking is routine; everything else is a warning.
    fn is_warning(&self) -> bool {
        !matches!(self, SecurityEventKind::UserUnblocked)
    }
}

impl From<&Denial> for SecurityEventKind {
    fn from(denial: &Denial) -> Self {
        match denial {
            Denial::RateLimited { .. } => SecurityEventKind::RateLimited,
            Denial::Blocked => SecurityEventKind::BlockedUserAccess,
            Denial::FloodDetected => SecurityEventKind::FloodDetected,
            Denial::SpamDetected => SecurityEventKind::SpamDetected,
            Denial::UnauthorizedAdmin => SecurityEventKind::UnauthorizedAdminAccess,
            Denial::InvalidInput => SecurityEventKind::InvalidInput,
            Denial::InvalidCoordinates => SecurityEventKind::InvalidCoordinates,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub user_id: UserId,
    pub kind: SecurityEventKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityEvent {
    /// Build an event. `details` may contain user text; it is redacted and clipped.
    pub fn new(user_id: UserId, kind: SecurityEventKind, details: &str) -> Self {
        Self {
            user_id,
            kind,
            details: clip_user_text(details),
            timestamp: Utc::now(),
        }
    }
}

/// Emit a security event on the `security_events` target and return it.
pub fn log_security_event(
    user_id: UserId,
    kind: SecurityEventKind,
    details: &str,
) -> SecurityEvent {
    let event = SecurityEvent::new(user_id, kind, details);
    if event.kind.is_warning() {
        warn!(
            target: "security_events",
            user_id = %event.user_id,
            event_type = event.kind.as_str(),
            details = %event.details,
            "Security event"
        );
    } else {
        info!(
            target: "security_events",
            user_id = %event.user_id,
            event_type = event.kind.as_str(),
            details = %event.details,
            "Security event"
        );
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_tags_match_event_kinds() {
        let denials = [
            Denial::Blocked,
            Denial::FloodDetected,
            Denial::SpamDetected,
            Denial::UnauthorizedAdmin,
            Denial::InvalidInput,
            Denial::InvalidCoordinates,
            Denial::RateLimited { reset_at: Utc::now() },
        ];
        for denial in &denials {
            assert_eq!(SecurityEventKind::from(denial).as_str(), denial.kind());
        }
    }

    #[test]
    fn event_details_are_clipped() {
        let event = log_security_event(
            UserId(5),
            SecurityEventKind::InvalidInput,
            &"<script>".repeat(100),
        );
        assert!(event.details.chars().count() <= crate::redact::MAX_LOGGED_TEXT + 1);
    }
}
