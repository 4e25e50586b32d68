//! Abuse guard: block list, flood ceiling, repeated-message detection, and
//! the admission check that combines them with admin-only actions.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;
use weatherbot_config::SecurityConfig;
use weatherbot_core::{Action, Clock, Denial, UserId};
use weatherbot_logging::{log_security_event, SecurityEventKind};

use crate::sanitize::{self, InputSanitizer};
use crate::window::{window_start, Window, WindowTracker};

/// Snapshot of guard state for admin reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityStats {
    pub blocked_count: usize,
    /// Distinct users with repeated-message history.
    pub tracked_spam: usize,
    pub tracked_flood: usize,
    pub blocked_users: Vec<UserId>,
}

pub struct AbuseGuard {
    admin_id: Option<UserId>,
    clock: Arc<dyn Clock>,
    blocked: RwLock<HashSet<UserId>>,
    flood: WindowTracker<UserId>,
    /// Keyed by user and a digest of the normalized message text.
    spam: WindowTracker<(UserId, String)>,
    sanitizer: InputSanitizer,
    retention: Duration,
}

impl AbuseGuard {
    /// `admin_id == 0` means no admin is configured.
    pub fn from_config(config: &SecurityConfig, admin_id: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            admin_id: (admin_id != 0).then_some(UserId(admin_id)),
            flood: WindowTracker::new(
                Window::per_minutes(config.max_messages_per_minute, 1),
                clock.clone(),
            ),
            spam: WindowTracker::new(
                Window::per_minutes(config.max_identical_messages, config.spam_window_minutes),
                clock.clone(),
            ),
            clock,
            blocked: RwLock::new(HashSet::new()),
            sanitizer: InputSanitizer::from_config(config),
            retention: Duration::minutes(config.tracking_retention_minutes.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Block list
    // -----------------------------------------------------------------------

    pub async fn is_blocked(&self, user_id: UserId) -> bool {
        self.blocked.read().await.contains(&user_id)
    }

    /// Returns `true` if the user was not blocked before.
    pub async fn block(&self, user_id: UserId, reason: &str) -> bool {
        let added = self.blocked.write().await.insert(user_id);
        if added {
            log_security_event(user_id, SecurityEventKind::UserBlocked, reason);
        }
        added
    }

    /// Returns `true` if the user was blocked before.
    pub async fn unblock(&self, user_id: UserId) -> bool {
        let removed = self.blocked.write().await.remove(&user_id);
        if removed {
            log_security_event(user_id, SecurityEventKind::UserUnblocked, "unblocked");
        }
        removed
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin_id == Some(user_id)
    }

    // -----------------------------------------------------------------------
    // Flood / repeated messages
    // -----------------------------------------------------------------------

    /// Count one message against the per-minute ceiling.
    pub async fn check_flood(&self, user_id: UserId) -> bool {
        if self.flood.record_event(user_id).await {
            return true;
        }
        let max = self.flood.window().max_count;
        log_security_event(
            user_id,
            SecurityEventKind::FloodDetected,
            &format!("exceeded {max} messages/minute"),
        );
        false
    }

    /// Count one occurrence of `text`. Denies once the same user has sent the
    /// same (case- and whitespace-insensitive) text too often within the spam
    /// window. Different texts never count against each other.
    pub async fn check_spam(&self, user_id: UserId, text: &str) -> bool {
        let key = (user_id, message_digest(text));
        if self.spam.record_event(key).await {
            return true;
        }
        let max = self.spam.window().max_count;
        log_security_event(
            user_id,
            SecurityEventKind::SpamDetected,
            &format!("more than {max} identical messages: {text}"),
        );
        false
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    /// Blocked users are rejected before the flood window is touched, so a
    /// blocked user never produces flood events.
    pub async fn authorize(&self, user_id: UserId, action: Action) -> Result<(), Denial> {
        if self.is_blocked(user_id).await {
            log_security_event(
                user_id,
                SecurityEventKind::BlockedUserAccess,
                &format!("attempted action: {action}"),
            );
            return Err(Denial::Blocked);
        }

        if !self.check_flood(user_id).await {
            return Err(Denial::FloodDetected);
        }

        if action.is_admin_only() && !self.is_admin(user_id) {
            log_security_event(
                user_id,
                SecurityEventKind::UnauthorizedAdminAccess,
                &format!("action: {action}"),
            );
            return Err(Denial::UnauthorizedAdmin);
        }

        debug!(user_id = %user_id, action = %action, "Permission check: allowed");
        Ok(())
    }

    pub async fn check_permissions(&self, user_id: UserId, action: Action) -> bool {
        self.authorize(user_id, action).await.is_ok()
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn sanitize(&self, text: &str) -> String {
        self.sanitizer.sanitize(text)
    }

    pub fn validate_location(&self, location: &str) -> bool {
        self.sanitizer.validate_location(location)
    }

    pub fn validate_coordinates(&self, latitude: f64, longitude: f64) -> bool {
        sanitize::validate_coordinates(latitude, longitude)
    }

    // -----------------------------------------------------------------------
    // Maintenance
    // -----------------------------------------------------------------------

    /// Drop flood and spam history older than the retention period.
    /// Returns how many tracker keys were removed.
    pub async fn cleanup_tracking(&self) -> usize {
        let cutoff = window_start(self.clock.now(), self.retention);
        self.flood.cleanup(cutoff).await + self.spam.cleanup(cutoff).await
    }

    pub async fn security_stats(&self) -> SecurityStats {
        let mut blocked_users: Vec<UserId> = self.blocked.read().await.iter().copied().collect();
        blocked_users.sort();

        let spam_users: HashSet<UserId> =
            self.spam.keys().await.into_iter().map(|(user, _)| user).collect();

        SecurityStats {
            blocked_count: blocked_users.len(),
            tracked_spam: spam_users.len(),
            tracked_flood: self.flood.len().await,
            blocked_users,
        }
    }
}

fn message_digest(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
