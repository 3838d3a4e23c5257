mod common;

use std::{sync::Arc, time::Duration};

use billing_sdk::{
    BillingError, BillingProvider, CheckoutStatus, CheckoutStatusPoller, CheckoutStatusResponse,
    PollOptions, PollPhase,
};
use common::{ScriptedClient, Step, settle};
use tokio::{sync::Notify, time::Instant};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_confirmed() {
    let client = ScriptedClient::new([
        Step::ok(
            CheckoutStatusResponse::new(CheckoutStatus::Pending)
                .with_confirmations(1, 3)
                .with_polling_interval_ms(2000),
        ),
        Step::ok(
            CheckoutStatusResponse::new(CheckoutStatus::Confirmed)
                .with_confirmations(3, 3)
                .with_confirmed_at("2024-01-01T00:00:00Z".parse().unwrap()),
        ),
    ]);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(Some("co_1"), PollOptions::default());
    assert!(poller.state().is_polling);
    settle().await;

    let state = poller.state();
    assert_eq!(state.status, Some(CheckoutStatus::Pending));
    assert_eq!(state.confirmations, 1);
    assert_eq!(state.required_confirmations, 3);
    assert!(state.is_polling);
    assert_eq!(poller.phase(), PollPhase::Waiting);
    assert_eq!(poller.effective_interval(), ms(2000));

    tokio::time::sleep(ms(1999)).await;
    assert_eq!(client.call_count(), 1);

    tokio::time::sleep(ms(2)).await;
    settle().await;

    let state = poller.state();
    assert_eq!(state.status, Some(CheckoutStatus::Confirmed));
    assert_eq!(state.confirmations, 3);
    assert!(state.confirmed_at.is_some());
    assert!(!state.is_polling);
    assert_eq!(poller.phase(), PollPhase::Terminal);
    assert_eq!(client.call_offsets(start), vec![ms(0), ms(2000)]);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_sequential() {
    // Each request takes 500ms, so the next one starts 500ms + interval later
    let steps = (0..4).map(|_| {
        Step::Delayed(ms(500), CheckoutStatusResponse::new(CheckoutStatus::Pending))
    });
    let client = ScriptedClient::new(steps);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(Some("co_1"), PollOptions::default());
    tokio::time::sleep(ms(10_600)).await;

    assert_eq!(
        client.call_offsets(start),
        vec![ms(0), ms(3500), ms(7000), ms(10_500)]
    );
    assert_eq!(client.max_in_flight(), 1);
    assert!(poller.state().is_polling);
}

#[tokio::test(start_paused = true)]
async fn test_every_terminal_status_stops_polling() {
    for status in [
        CheckoutStatus::Confirmed,
        CheckoutStatus::Expired,
        CheckoutStatus::Failed,
    ] {
        let client = ScriptedClient::new([Step::ok(CheckoutStatusResponse::new(status))]);
        let poller = CheckoutStatusPoller::new(client.clone());

        poller.start(Some("co_1"), PollOptions::default());
        settle().await;

        assert_eq!(poller.state().status, Some(status));
        assert!(!poller.state().is_polling);
        assert_eq!(poller.phase(), PollPhase::Terminal);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(client.call_count(), 1, "{status} should not be polled again");
    }
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_snapshot_and_retries() {
    let client = ScriptedClient::new([
        Step::ok(
            CheckoutStatusResponse::new(CheckoutStatus::Detected)
                .with_confirmations(1, 19)
                .with_tx_hash("0xfeed"),
        ),
        Step::network_error(),
        Step::ok(CheckoutStatusResponse::new(CheckoutStatus::Confirming).with_confirmations(2, 19)),
    ]);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    tokio::time::sleep(ms(3001)).await;

    let state = poller.state();
    assert_eq!(state.status, Some(CheckoutStatus::Detected));
    assert_eq!(state.confirmations, 1);
    assert_eq!(state.tx_hash.as_deref(), Some("0xfeed"));
    assert!(state.is_polling);
    let error = state.error.expect("error should be recorded");
    assert_eq!(error.to_string(), "connection reset by peer");
    assert_eq!(poller.phase(), PollPhase::Waiting);

    tokio::time::sleep(ms(3000)).await;

    let state = poller.state();
    assert_eq!(state.status, Some(CheckoutStatus::Confirming));
    assert_eq!(state.confirmations, 2);
    assert!(state.error.is_none());
    assert_eq!(client.call_offsets(start), vec![ms(0), ms(3000), ms(6000)]);
}

#[tokio::test(start_paused = true)]
async fn test_first_request_failure_uses_default_interval() {
    let client = ScriptedClient::new([Step::network_error()]);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;

    let state = poller.state();
    assert_eq!(state.status, None);
    assert!(state.error.is_some());
    assert!(state.is_polling);
    assert_eq!(poller.effective_interval(), ms(3000));

    tokio::time::sleep(ms(3001)).await;
    assert_eq!(client.call_offsets(start), vec![ms(0), ms(3000)]);
}

#[tokio::test(start_paused = true)]
async fn test_interval_override_wins_over_server() {
    let steps = (0..3).map(|_| {
        Step::ok(CheckoutStatusResponse::new(CheckoutStatus::Pending).with_polling_interval_ms(1000))
    });
    let client = ScriptedClient::new(steps);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(
        Some("co_1"),
        PollOptions::default().with_polling_interval_ms(5000),
    );
    tokio::time::sleep(ms(10_001)).await;

    assert_eq!(
        client.call_offsets(start),
        vec![ms(0), ms(5000), ms(10_000)]
    );
    assert_eq!(poller.effective_interval(), ms(5000));
}

#[tokio::test(start_paused = true)]
async fn test_zero_server_interval_is_ignored() {
    let client = ScriptedClient::new([Step::ok(
        CheckoutStatusResponse::new(CheckoutStatus::Pending).with_polling_interval_ms(0),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());
    let start = Instant::now();

    poller.start(Some("co_1"), PollOptions::default());
    tokio::time::sleep(ms(3001)).await;

    assert_eq!(client.call_offsets(start), vec![ms(0), ms(3000)]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_response() {
    let gate = Arc::new(Notify::new());
    let client = ScriptedClient::new([Step::Gated(
        Arc::clone(&gate),
        CheckoutStatusResponse::new(CheckoutStatus::Confirmed),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(poller.phase(), PollPhase::InFlight);

    poller.stop();
    gate.notify_one();
    settle().await;

    let state = poller.state();
    assert!(!state.is_polling);
    assert_eq!(state.status, None);
    assert_eq!(poller.phase(), PollPhase::Idle);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.call_count(), 1);
    assert!(!poller.state().is_polling);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_timer_and_is_idempotent() {
    let client = ScriptedClient::new([]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(poller.phase(), PollPhase::Waiting);

    poller.stop();
    poller.stop();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.call_count(), 1);
    assert_eq!(poller.phase(), PollPhase::Idle);
    assert_eq!(poller.state().status, Some(CheckoutStatus::Pending));
    assert!(!poller.state().is_polling);
}

#[tokio::test(start_paused = true)]
async fn test_disabling_keeps_last_snapshot() {
    let client = ScriptedClient::new([Step::ok(
        CheckoutStatusResponse::new(CheckoutStatus::Pending).with_confirmations(1, 3),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;

    poller.start(Some("co_1"), PollOptions::disabled());
    let state = poller.state();
    assert!(!state.is_polling);
    assert_eq!(state.status, Some(CheckoutStatus::Pending));
    assert_eq!(state.confirmations, 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_or_missing_id_issues_no_request() {
    let client = ScriptedClient::new([]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(None, PollOptions::default());
    poller.start(Some(""), PollOptions::default());
    poller.start(Some("co_1"), PollOptions::disabled());
    settle().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(client.call_count(), 0);
    assert!(!poller.state().is_polling);
    assert_eq!(poller.phase(), PollPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_terminal_status_is_sticky_per_instance() {
    let client = ScriptedClient::new([Step::ok(
        CheckoutStatusResponse::new(CheckoutStatus::Expired),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(poller.phase(), PollPhase::Terminal);

    // Restarting on the same id does not resume polling
    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(client.call_count(), 1);
    assert_eq!(poller.state().status, Some(CheckoutStatus::Expired));
    assert!(!poller.state().is_polling);

    // Nor does coming back to it after observing another checkout
    poller.start(Some("co_2"), PollOptions::default());
    settle().await;
    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(poller.state().status, Some(CheckoutStatus::Expired));
    assert_eq!(poller.phase(), PollPhase::Terminal);
    assert_eq!(client.call_count(), 2);

    // A fresh instance always asks at least once
    let fresh = CheckoutStatusPoller::new(client.clone());
    fresh.start(Some("co_1"), PollOptions::default());
    settle().await;
    assert_eq!(client.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_changing_id_does_not_leak_previous_work() {
    let gate = Arc::new(Notify::new());
    let client = ScriptedClient::new([
        Step::Gated(
            Arc::clone(&gate),
            CheckoutStatusResponse::new(CheckoutStatus::Confirming).with_confirmations(2, 3),
        ),
        Step::ok(CheckoutStatusResponse::new(CheckoutStatus::Created)),
    ]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;

    poller.start(Some("co_2"), PollOptions::default());
    settle().await;
    gate.notify_one();
    settle().await;

    let state = poller.state();
    assert_eq!(state.status, Some(CheckoutStatus::Created));
    assert_eq!(state.confirmations, 0);
    assert!(state.is_polling);
    assert_eq!(poller.checkout_id().as_deref(), Some("co_2"));

    let ids: Vec<_> = client.calls().into_iter().map(|c| c.checkout_id).collect();
    assert_eq!(ids, vec!["co_1", "co_2"]);
}

#[tokio::test(start_paused = true)]
async fn test_independent_instances() {
    let client = ScriptedClient::new([]);
    let first = CheckoutStatusPoller::new(client.clone());
    let second = CheckoutStatusPoller::new(client.clone());

    first.start(Some("co_1"), PollOptions::default());
    second.start(Some("co_2"), PollOptions::default().with_polling_interval_ms(1000));
    settle().await;

    first.stop();
    tokio::time::sleep(ms(2001)).await;

    let ids: Vec<_> = client.calls().into_iter().map(|c| c.checkout_id).collect();
    assert_eq!(ids, vec!["co_1", "co_2", "co_2", "co_2"]);
    assert!(!first.state().is_polling);
    assert!(second.state().is_polling);
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_settled() {
    let client = ScriptedClient::new([
        Step::ok(CheckoutStatusResponse::new(CheckoutStatus::Pending)),
        Step::ok(CheckoutStatusResponse::new(CheckoutStatus::Detected).with_tx_hash("0xabc")),
        Step::ok(
            CheckoutStatusResponse::new(CheckoutStatus::Confirmed)
                .with_confirmations(3, 3)
                .with_tx_hash("0xabc"),
        ),
    ]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    let state = poller.wait_until_settled().await;

    assert_eq!(state.status, Some(CheckoutStatus::Confirmed));
    assert_eq!(state.tx_hash.as_deref(), Some("0xabc"));
    assert!(!state.is_polling);
    assert_eq!(client.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_whole_snapshots() {
    let client = ScriptedClient::new([Step::ok(
        CheckoutStatusResponse::new(CheckoutStatus::Confirmed)
            .with_confirmations(3, 3)
            .with_tx_hash("0xabc"),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());
    let mut rx = poller.subscribe();

    poller.start(Some("co_1"), PollOptions::default());

    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.status.is_some() {
            // Status, confirmations and hash always arrive together
            assert_eq!(state.confirmations, 3);
            assert_eq!(state.tx_hash.as_deref(), Some("0xabc"));
        }
        let done = !state.is_polling && state.status.is_some();
        seen.push(state);
        if done {
            break;
        }
    }

    assert!(seen.last().unwrap().is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_polling() {
    let client = ScriptedClient::new([]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    drop(poller);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.call_count(), 1);
}

#[test]
fn test_from_provider_without_client() {
    let provider = BillingProvider::default();
    let result = CheckoutStatusPoller::from_provider(&provider);
    assert!(matches!(result, Err(BillingError::MissingClient)));
}

#[tokio::test(start_paused = true)]
async fn test_restart_with_same_id_never_reports_not_polling() {
    let gate = Arc::new(Notify::new());
    let client = ScriptedClient::new([Step::Gated(
        gate.clone(),
        CheckoutStatusResponse::new(CheckoutStatus::Pending),
    )]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());
    settle().await;
    let mut rx = poller.subscribe();
    assert!(rx.borrow_and_update().is_polling);

    poller.start(Some("co_1"), PollOptions::default().with_polling_interval_ms(5000));
    assert!(!rx.has_changed().unwrap());
    assert!(poller.state().is_polling);
    assert_eq!(poller.effective_interval(), ms(5000));

    gate.notify_waiters();
    settle().await;
    assert_eq!(client.call_count(), 2);
    assert!(poller.state().is_polling);
}

#[test]
fn test_start_outside_runtime_reports_error() {
    let client = ScriptedClient::new([]);
    let poller = CheckoutStatusPoller::new(client.clone());

    poller.start(Some("co_1"), PollOptions::default());

    let state = poller.state();
    assert!(!state.is_polling);
    assert!(matches!(state.error.as_deref(), Some(BillingError::Other(_))));
    assert_eq!(poller.phase(), PollPhase::Idle);
    assert_eq!(client.call_count(), 0);
}
