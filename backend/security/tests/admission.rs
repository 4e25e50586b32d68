use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use weatherbot_config::BotConfig;
use weatherbot_core::{Action, Clock, Denial, ManualClock, UserId};
use weatherbot_security::{InboundRequest, RequestGate};

const ADMIN: i64 = 777;

fn gate_with(max_requests: u32) -> (ManualClock, RequestGate) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    let mut config = BotConfig {
        admin_id: ADMIN,
        ..Default::default()
    };
    config.rate_limit.max_requests = max_requests;
    // Keep flood and spam out of the way unless a test wants them.
    config.security.max_messages_per_minute = 1000;
    config.security.max_identical_messages = 1000;
    let gate = RequestGate::from_config(&config, Arc::new(clock.clone()));
    (clock, gate)
}

fn default_gate() -> (ManualClock, RequestGate) {
    let clock = ManualClock::default();
    let config = BotConfig {
        admin_id: ADMIN,
        ..Default::default()
    };
    let gate = RequestGate::from_config(&config, Arc::new(clock.clone()));
    (clock, gate)
}

#[tokio::test]
async fn requests_beyond_limit_are_denied_and_not_counted() {
    let (_clock, gate) = gate_with(5);
    let user = UserId(1);

    for n in 1..=5u32 {
        let admission = gate.admit(&InboundRequest::text(user, "Oslo")).await.unwrap();
        assert_eq!(admission.remaining_requests, Some(5 - n));
    }
    for _ in 0..3 {
        let denial = gate.admit(&InboundRequest::text(user, "Oslo")).await.unwrap_err();
        assert!(matches!(denial, Denial::RateLimited { .. }));
    }
    assert_eq!(gate.limiter().remaining(user).await, 0);
}

#[tokio::test]
async fn rate_limit_resets_after_window() {
    let (clock, gate) = gate_with(1);
    let user = UserId(2);
    let start = clock.now();

    gate.admit(&InboundRequest::location(user, 10.0, 10.0)).await.unwrap();
    let denial = gate.admit(&InboundRequest::location(user, 10.0, 10.0)).await.unwrap_err();
    assert_eq!(
        denial,
        Denial::RateLimited {
            reset_at: start + Duration::hours(24)
        }
    );
    assert!(denial.user_message(clock.now()).contains("24h 0m"));

    clock.advance(Duration::hours(24));
    assert!(gate.admit(&InboundRequest::location(user, 10.0, 10.0)).await.is_ok());
}

#[tokio::test]
async fn invalid_input_does_not_spend_a_lookup() {
    let (_clock, gate) = gate_with(2);
    let user = UserId(3);

    let bad = [
        InboundRequest::text(user, "<img onerror=x>"),
        InboundRequest::text(user, "<script>alert(1)</script>"),
        InboundRequest::text(user, "Rome; rm -rf /"),
    ];
    for request in &bad {
        assert_eq!(gate.admit(request).await.unwrap_err(), Denial::InvalidInput);
    }
    assert_eq!(
        gate.admit(&InboundRequest::location(user, 91.0, 0.0)).await.unwrap_err(),
        Denial::InvalidCoordinates
    );
    assert_eq!(
        gate.admit(&InboundRequest::location(user, 45.0, -200.0)).await.unwrap_err(),
        Denial::InvalidCoordinates
    );
    assert_eq!(gate.limiter().remaining(user).await, 2);
}

#[tokio::test]
async fn sanitized_text_is_handed_to_the_handler() {
    let (_clock, gate) = gate_with(5);
    let admission = gate
        .admit(&InboundRequest::text(UserId(4), "  New   York, <script>x</script> NY "))
        .await
        .unwrap();
    assert_eq!(admission.action, Action::TextMessage);
    assert_eq!(admission.sanitized_text.as_deref(), Some("New York, NY"));
}

#[tokio::test]
async fn flood_ceiling_blocks_eleventh_message_then_recovers() {
    let (clock, gate) = default_gate();
    let user = UserId(5);

    for _ in 0..10 {
        assert!(gate.admit(&InboundRequest::command(user, Action::Help)).await.is_ok());
    }
    assert_eq!(
        gate.admit(&InboundRequest::command(user, Action::Help)).await.unwrap_err(),
        Denial::FloodDetected
    );

    clock.advance(Duration::seconds(61));
    assert!(gate.admit(&InboundRequest::command(user, Action::Help)).await.is_ok());
}

#[tokio::test]
async fn blocking_overrides_everything_until_unblocked() {
    let (_clock, gate) = gate_with(5);
    let user = UserId(6);
    gate.guard().block(user, "manual").await;

    for request in [
        InboundRequest::command(user, Action::Start),
        InboundRequest::text(user, "Lima"),
        InboundRequest::location(user, 0.0, 0.0),
    ] {
        assert_eq!(gate.admit(&request).await.unwrap_err(), Denial::Blocked);
    }
    assert_eq!(gate.limiter().remaining(user).await, 5);

    gate.guard().unblock(user).await;
    assert!(gate.admit(&InboundRequest::text(user, "Lima")).await.is_ok());
}

#[tokio::test]
async fn admin_actions_only_for_admin() {
    let (_clock, gate) = gate_with(5);
    assert_eq!(
        gate.admit(&InboundRequest::command(UserId(8), Action::Stats)).await.unwrap_err(),
        Denial::UnauthorizedAdmin
    );
    let admission = gate
        .admit(&InboundRequest::command(UserId(ADMIN), Action::Stats))
        .await
        .unwrap();
    assert_eq!(admission.remaining_requests, None);
}

#[tokio::test]
async fn keyboard_buttons_skip_the_rate_limit() {
    let (_clock, gate) = gate_with(1);
    let user = UserId(9);
    for _ in 0..3 {
        let admission = gate.admit(&InboundRequest::text(user, "💝 Donate")).await.unwrap();
        assert_eq!(admission.action, Action::Donate);
    }
    assert_eq!(gate.limiter().remaining(user).await, 1);
}

#[tokio::test]
async fn repeated_identical_text_is_spam() {
    let (_clock, gate) = default_gate();
    let user = UserId(10);
    for _ in 0..3 {
        assert!(gate.admit(&InboundRequest::text(user, "Tokyo")).await.is_ok());
    }
    assert_eq!(
        gate.admit(&InboundRequest::text(user, "Tokyo")).await.unwrap_err(),
        Denial::SpamDetected
    );
    assert!(gate.admit(&InboundRequest::text(user, "Kyoto")).await.is_ok());
}

#[tokio::test]
async fn missing_payload_is_invalid_for_messages() {
    let (_clock, gate) = gate_with(5);
    let user = UserId(11);
    assert_eq!(
        gate.admit(&InboundRequest::command(user, Action::TextMessage)).await.unwrap_err(),
        Denial::InvalidInput
    );
    assert_eq!(
        gate.admit(&InboundRequest::command(user, Action::LocationMessage)).await.unwrap_err(),
        Denial::InvalidInput
    );
    assert_eq!(gate.limiter().remaining(user).await, 5);
}

#[tokio::test]
async fn only_lookup_callbacks_spend_the_limit() {
    let (_clock, gate) = gate_with(2);
    let user = UserId(12);

    for data in ["back_to_menu", "settings_units", "donate_stars", "stars_100"] {
        let admission = gate.admit(&InboundRequest::callback(user, data)).await.unwrap();
        assert_eq!(admission.remaining_requests, None, "{data}");
    }
    let bare = gate.admit(&InboundRequest::command(user, Action::Callback)).await.unwrap();
    assert_eq!(bare.remaining_requests, None);
    assert_eq!(gate.limiter().remaining(user).await, 2);

    let refresh = gate
        .admit(&InboundRequest::callback(user, "refresh_51.5074_-0.1278"))
        .await
        .unwrap();
    assert_eq!(refresh.remaining_requests, Some(1));
    let forecast = gate
        .admit(&InboundRequest::callback(user, "forecast_35.68_139.69"))
        .await
        .unwrap();
    assert_eq!(forecast.remaining_requests, Some(0));
    assert!(matches!(
        gate.admit(&InboundRequest::callback(user, "current_35.68_139.69")).await,
        Err(Denial::RateLimited { .. })
    ));

    // Navigation keeps working once the lookups are spent.
    assert!(gate.admit(&InboundRequest::callback(user, "back_to_menu")).await.is_ok());
}

#[tokio::test]
async fn malformed_lookup_callbacks_are_rejected_without_spending() {
    let (_clock, gate) = gate_with(5);
    let user = UserId(13);
    assert_eq!(
        gate.admit(&InboundRequest::callback(user, "refresh_north_south")).await.unwrap_err(),
        Denial::InvalidInput
    );
    assert_eq!(
        gate.admit(&InboundRequest::callback(user, "forecast_95_10")).await.unwrap_err(),
        Denial::InvalidCoordinates
    );
    assert_eq!(gate.limiter().remaining(user).await, 5);
}

#[tokio::test]
async fn concurrent_users_do_not_interfere() {
    let (_clock, gate) = gate_with(3);
    let gate = Arc::new(gate);

    let mut handles = Vec::new();
    for id in 0..8i64 {
        let gate = gate.clone();
        handles.push(tokio::spawn(async move {
            let user = UserId(100 + id);
            let mut admitted = 0;
            for _ in 0..5 {
                if gate.admit(&InboundRequest::location(user, 1.0, 1.0)).await.is_ok() {
                    admitted += 1;
                }
            }
            admitted
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 3);
    }
}

#[tokio::test]
async fn cleanup_evicts_idle_identities() {
    let (clock, gate) = gate_with(5);
    gate.admit(&InboundRequest::text(UserId(12), "Cairo")).await.unwrap();
    assert_eq!(gate.cleanup().await, 0);

    clock.advance(Duration::hours(25));
    // rate limiter + flood + spam entries for the one user
    assert_eq!(gate.cleanup().await, 3);
    let stats = gate.guard().security_stats().await;
    assert_eq!((stats.tracked_flood, stats.tracked_spam), (0, 0));
    assert_eq!(gate.limiter().tracked_users().await, 0);
}
