//! Sliding-window event counter keyed by an arbitrary identity.
//!
//! Each key owns a chronologically ordered queue of event timestamps. An
//! event counts toward the window while it is strictly newer than
//! `now - duration`; an event sitting exactly on the cutoff has expired.
//! Expired entries are evicted lazily when the key is recorded again, and
//! in bulk by [`WindowTracker::cleanup`].

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use weatherbot_core::Clock;

/// How many events are permitted within a trailing duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub max_count: u32,
    pub duration: Duration,
}

impl Window {
    pub fn new(max_count: u32, duration: Duration) -> Self {
        Self { max_count, duration }
    }

    pub fn per_minutes(max_count: u32, minutes: u32) -> Self {
        Self::new(max_count, Duration::minutes(minutes.into()))
    }

    pub fn per_hours(max_count: u32, hours: u32) -> Self {
        Self::new(max_count, Duration::hours(hours.into()))
    }
}

type Timeline = VecDeque<DateTime<Utc>>;

pub struct WindowTracker<K> {
    window: Window,
    clock: Arc<dyn Clock>,
    events: Mutex<HashMap<K, Timeline>>,
}

impl<K> WindowTracker<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(window: Window, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            events: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Record an event for `key` if the window has room.
    ///
    /// Returns `false` without recording anything when the key already has
    /// `max_count` live events.
    pub async fn record_event(&self, key: K) -> bool {
        let mut events = self.events.lock().await;
        let now = self.clock.now();
        let cutoff = window_start(now, self.window.duration);

        let live = match events.get_mut(&key) {
            Some(timeline) => {
                evict_expired(timeline, cutoff);
                timeline.len()
            }
            None => 0,
        };
        if live >= self.window.max_count as usize {
            return false;
        }

        let timeline = events.entry(key).or_default();
        // Keep the queue sorted even if the clock was set backwards.
        let at = timeline.partition_point(|t| *t <= now);
        timeline.insert(at, now);
        true
    }

    /// Slots left in the current window. Does not mutate state.
    pub async fn remaining(&self, key: &K) -> u32 {
        let live = self.live_count(key).await;
        self.window.max_count.saturating_sub(live as u32)
    }

    /// Number of live events for `key`.
    pub async fn live_count(&self, key: &K) -> usize {
        let events = self.events.lock().await;
        let cutoff = window_start(self.clock.now(), self.window.duration);
        events
            .get(key)
            .map(|timeline| timeline.len() - timeline.partition_point(|t| *t <= cutoff))
            .unwrap_or(0)
    }

    /// When the oldest live event for `key` leaves the window; `now` if there is none.
    pub async fn reset_time(&self, key: &K) -> DateTime<Utc> {
        let events = self.events.lock().await;
        let now = self.clock.now();
        let cutoff = window_start(now, self.window.duration);
        events
            .get(key)
            .and_then(|timeline| timeline.iter().find(|t| **t > cutoff))
            .map(|oldest| {
                oldest
                    .checked_add_signed(self.window.duration)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            })
            .unwrap_or(now)
    }

    /// Drop every event at or before `cutoff` and forget keys left empty.
    ///
    /// Returns the number of keys removed.
    pub async fn cleanup(&self, cutoff: DateTime<Utc>) -> usize {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|_, timeline| {
            evict_expired(timeline, cutoff);
            !timeline.is_empty()
        });
        before - events.len()
    }

    /// Evict everything outside the configured window, relative to now.
    pub async fn cleanup_expired(&self) -> usize {
        let cutoff = window_start(self.clock.now(), self.window.duration);
        self.cleanup(cutoff).await
    }

    /// Number of keys currently holding history.
    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<K> {
        self.events.lock().await.keys().cloned().collect()
    }

    /// Forget all history.
    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

/// `now - duration`, clamped to the earliest representable instant.
pub(crate) fn window_start(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(duration)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn evict_expired(timeline: &mut Timeline, cutoff: DateTime<Utc>) {
    while timeline.front().is_some_and(|t| *t <= cutoff) {
        timeline.pop_front();
    }
}
