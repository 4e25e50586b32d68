//! Replay: drive the admission gate from a JSON-lines request log.
//!
//! Each line is either a request
//! `{"userId": 1, "action": "text_message", "payload": {"type": "text", "text": "Oslo"}, "at": "2024-01-01T00:00:00Z"}`
//! or an operator op `{"op": "block", "userId": 1, "reason": "spam"}`,
//! `{"op": "unblock", "userId": 1}`, `{"op": "cleanup"}`.
//! `at` is optional and moves the replay clock; time never comes from the host.
//! Cleanup sweeps follow the replay clock too: one runs before any request
//! that lands `cleanup.intervalSecs` or more after the previous sweep.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use weatherbot_config::BotConfig;
use weatherbot_core::{Action, Clock, ManualClock, UserId};
use weatherbot_scheduler::Sweep;
use weatherbot_security::{InboundRequest, RequestGate};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op {
    Block {
        #[serde(rename = "userId")]
        user_id: UserId,
        #[serde(default)]
        reason: Option<String>,
    },
    Unblock {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Cleanup,
}

#[derive(Debug, Deserialize)]
struct TimedRequest {
    #[serde(default)]
    at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    request: InboundRequest,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Line {
    Op(Op),
    Request(TimedRequest),
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Decision {
    user_id: UserId,
    action: Action,
    admitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    denial: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sanitized_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<u32>,
}

/// Sweep schedule on replay time rather than host time.
struct ReplaySweeper {
    every: Option<Duration>,
    next_due: Option<DateTime<Utc>>,
}

impl ReplaySweeper {
    fn new(interval_secs: u64) -> Self {
        let every = Duration::from_std(std::time::Duration::from_secs(interval_secs)).ok();
        Self {
            every: every.filter(|every| *every > Duration::zero()),
            next_due: None,
        }
    }

    /// Sweep `target` if replay time has reached the next due point.
    async fn catch_up<S: Sweep + ?Sized>(&mut self, target: &S, now: DateTime<Utc>) -> usize {
        let Some(every) = self.every else {
            return 0;
        };
        let schedule_from = |at: DateTime<Utc>| {
            at.checked_add_signed(every).unwrap_or(DateTime::<Utc>::MAX_UTC)
        };
        match self.next_due {
            None => {
                self.next_due = Some(schedule_from(now));
                0
            }
            Some(due) if now >= due => {
                self.next_due = Some(schedule_from(now));
                let evicted = target.sweep().await;
                debug!(evicted, at = %now, "Replay sweep");
                evicted
            }
            Some(_) => 0,
        }
    }
}

pub async fn run(config: &BotConfig, input: Option<&Path>) -> Result<()> {
    let clock = ManualClock::new(Utc::now());
    let gate = RequestGate::from_config(config, Arc::new(clock.clone()));
    let mut sweeper = ReplaySweeper::new(config.cleanup.interval_secs);

    let mut out = Vec::new();
    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open replay input: {}", path.display()))?;
            replay(&gate, &clock, &mut sweeper, BufReader::new(file), &mut out).await?;
        }
        None => {
            let stdin = BufReader::new(tokio::io::stdin());
            replay(&gate, &clock, &mut sweeper, stdin, &mut out).await?;
        }
    }

    for line in out {
        println!("{line}");
    }
    let stats = gate.guard().security_stats().await;
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}

async fn replay<R: AsyncBufRead + Unpin>(
    gate: &RequestGate,
    clock: &ManualClock,
    sweeper: &mut ReplaySweeper,
    reader: R,
    out: &mut Vec<String>,
) -> Result<()> {
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(raw) = lines.next_line().await? {
        line_no += 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let line: Line = match serde_json::from_str(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(line = line_no, error = %e, "Skipping unparseable replay line");
                continue;
            }
        };
        match line {
            Line::Op(Op::Block { user_id, reason }) => {
                gate.guard()
                    .block(user_id, reason.as_deref().unwrap_or("Security violation"))
                    .await;
            }
            Line::Op(Op::Unblock { user_id }) => {
                gate.guard().unblock(user_id).await;
            }
            Line::Op(Op::Cleanup) => {
                gate.cleanup().await;
            }
            Line::Request(timed) => {
                if let Some(at) = timed.at {
                    clock.set(at);
                }
                sweeper.catch_up(gate, clock.now()).await;
                let decision = decide(gate, clock, &timed.request).await;
                out.push(serde_json::to_string(&decision)?);
            }
        }
    }
    Ok(())
}

async fn decide(gate: &RequestGate, clock: &ManualClock, request: &InboundRequest) -> Decision {
    match gate.admit(request).await {
        Ok(admission) => Decision {
            user_id: request.user_id,
            action: admission.action,
            admitted: true,
            denial: None,
            reply: None,
            sanitized_text: admission.sanitized_text,
            remaining: admission.remaining_requests,
        },
        Err(denial) => Decision {
            user_id: request.user_id,
            action: request.action,
            admitted: false,
            denial: Some(denial.kind()),
            reply: Some(denial.user_message(clock.now())),
            sanitized_text: None,
            remaining: None,
        },
    }
}
