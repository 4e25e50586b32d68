//! Per-user sliding-window limit on weather lookups.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use weatherbot_config::RateLimitConfig;
use weatherbot_core::{Clock, UserId};

use crate::window::{Window, WindowTracker};

pub struct RateLimiter {
    tracker: WindowTracker<UserId>,
}

impl RateLimiter {
    pub fn new(window: Window, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracker: WindowTracker::new(window, clock),
        }
    }

    pub fn from_config(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Window::per_hours(config.max_requests, config.window_hours),
            clock,
        )
    }

    pub fn max_requests(&self) -> u32 {
        self.tracker.window().max_count
    }

    /// Admit and count one request. A denied request is not counted, so a
    /// user turned away here can retry later without penalty.
    pub async fn check(&self, user_id: UserId) -> bool {
        let allowed = self.tracker.record_event(user_id).await;
        if allowed {
            debug!(user_id = %user_id, "Rate limit check: allowed");
        } else {
            debug!(user_id = %user_id, max = self.max_requests(), "Rate limit check: denied");
        }
        allowed
    }

    pub async fn remaining(&self, user_id: UserId) -> u32 {
        self.tracker.remaining(&user_id).await
    }

    pub async fn reset_time(&self, user_id: UserId) -> DateTime<Utc> {
        self.tracker.reset_time(&user_id).await
    }

    /// Forget users whose history has fully aged out. Returns how many.
    pub async fn cleanup(&self) -> usize {
        self.tracker.cleanup_expired().await
    }

    pub async fn tracked_users(&self) -> usize {
        self.tracker.len().await
    }
}
