/// Sweeper — periodically evicts aged-out rate-limit and abuse history.
///
/// Trackers only evict lazily per user, so identities that stop writing would
/// otherwise stay in memory forever. The sweeper runs the explicit cleanup
/// passes on a fixed interval until shutdown is signalled.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use weatherbot_security::RequestGate;

/// Something holding in-memory history that can be swept.
#[async_trait]
pub trait Sweep: Send + Sync {
    /// Evict expired state. Returns how many entries were removed.
    async fn sweep(&self) -> usize;
}

#[async_trait]
impl Sweep for RequestGate {
    async fn sweep(&self) -> usize {
        self.cleanup().await
    }
}

/// Sweep `target` every `interval` until `shutdown` flips to `true` or its
/// sender is dropped. Returns the total number of evicted entries.
pub async fn run_sweeper<S: Sweep + ?Sized>(
    target: Arc<S>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip it so sweeps start one interval in.
    ticker.tick().await;

    let mut total = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = target.sweep().await;
                total += evicted;
                if evicted > 0 {
                    info!(evicted, total, "[Sweeper] Evicted expired tracking entries");
                } else {
                    debug!("[Sweeper] Nothing to evict");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(total, "[Sweeper] Stopping");
                    break;
                }
            }
        }
    }
    total
}

pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl SweeperHandle {
    /// Signal the sweeper to stop and wait for it. Returns the total evicted.
    pub async fn shutdown(self) -> Result<usize> {
        let _ = self.shutdown.send(true);
        Ok(self.task.await?)
    }
}

pub fn spawn_sweeper<S: Sweep + ?Sized + 'static>(target: Arc<S>, interval: Duration) -> SweeperHandle {
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(run_sweeper(target, interval, rx));
    SweeperHandle { shutdown: tx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use weatherbot_config::BotConfig;
    use weatherbot_core::{ManualClock, UserId};
    use weatherbot_security::InboundRequest;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Sweep for Counting {
        async fn sweep(&self) -> usize {
            self.calls.fetch_add(1, Ordering::SeqCst);
            2
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_interval_until_shutdown() {
        let target = Arc::new(Counting::default());
        let handle = spawn_sweeper(target.clone(), Duration::from_secs(60));

        time::sleep(Duration::from_secs(185)).await;
        let total = handle.shutdown().await.unwrap();

        assert_eq!(target.calls.load(Ordering::SeqCst), 3);
        assert_eq!(total, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_sender_stops_loop() {
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(run_sweeper(
            Arc::new(Counting::default()),
            Duration::from_secs(60),
            rx,
        ));
        drop(tx);
        assert_eq!(task.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_request_gate() {
        let clock = ManualClock::default();
        let gate = Arc::new(RequestGate::from_config(
            &BotConfig::default(),
            Arc::new(clock.clone()),
        ));
        gate.admit(&InboundRequest::location(UserId(1), 1.0, 2.0))
            .await
            .unwrap();

        clock.advance(chrono::Duration::hours(25));
        let handle = spawn_sweeper(gate.clone(), Duration::from_secs(300));
        time::sleep(Duration::from_secs(301)).await;

        assert_eq!(handle.shutdown().await.unwrap(), 2);
        assert_eq!(gate.limiter().tracked_users().await, 0);
    }
}
