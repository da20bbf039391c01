//! End-to-end request lifecycle tests against a scripted client

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use pantry_core::http::{HttpError, Method};
use pantry_http::{
    RequestBody, RequestDispatcher, RequestStatus, SupersedePolicy, GENERIC_FAILURE,
};
use pantry_testing::{helpers::init_test_tracing, MockHttpClient};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE: &str = "https://db.test";
const WAIT: Duration = Duration::from_secs(1);

fn dispatcher(client: &MockHttpClient) -> RequestDispatcher<serde_json::Value> {
    init_test_tracing();
    RequestDispatcher::new(Arc::new(client.clone()))
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn post_sugar_succeeds_with_server_key() {
    let client = MockHttpClient::new();
    client.respond_with(json!({"name": "xyz123"}));
    let dispatcher = dispatcher(&client);

    let sugar = json!({"title": "Sugar", "amount": "2"});
    let body = RequestBody::json(&sugar).unwrap();
    let mut ticket = dispatcher
        .send(
            &format!("{BASE}/ingredients.json"),
            Method::Post,
            Some(body.into()),
            Some(sugar.clone()),
            Some("ADD"),
        )
        .unwrap();

    assert!(dispatcher.snapshot().is_loading());
    ticket.wait_with_timeout(WAIT).await.unwrap();

    let state = dispatcher.snapshot();
    assert_eq!(state.status(), RequestStatus::Succeeded);
    assert!(!state.is_loading());
    assert!(state.error().is_none());
    assert_eq!(state.data(), Some(&json!({"name": "xyz123"})));
    assert_eq!(state.extra(), Some(&sugar));
    assert_eq!(state.identifier(), Some("ADD"));
    assert_eq!(state.resolved(), Some(ticket.id()));
}

#[tokio::test]
async fn delete_with_network_failure_reports_generic_error() {
    let client = MockHttpClient::new();
    client.fail_with(HttpError::Transport("connection reset".to_string()));
    let dispatcher = dispatcher(&client);

    let mut ticket = dispatcher
        .send(
            &format!("{BASE}/ingredients/k1.json"),
            Method::Delete,
            None,
            Some(json!("k1")),
            Some("REMOVE_INGREDIENT"),
        )
        .unwrap();
    ticket.wait_with_timeout(WAIT).await.unwrap();

    let state = dispatcher.snapshot();
    assert_eq!(state.status(), RequestStatus::Failed);
    assert!(!state.is_loading());
    assert_eq!(state.error(), Some(GENERIC_FAILURE));
    assert!(state.data().is_none());
    assert_eq!(client.requests()[0].method, Method::Delete);
}

#[tokio::test]
async fn delete_returning_null_is_a_success_with_null_data() {
    let client = MockHttpClient::new();
    client.respond_with(serde_json::Value::Null);
    let dispatcher = dispatcher(&client);

    let mut ticket = dispatcher
        .send(&format!("{BASE}/ingredients/k1.json"), Method::Delete, None, None, None)
        .unwrap();
    ticket.wait_with_timeout(WAIT).await.unwrap();

    let state = dispatcher.snapshot();
    assert_eq!(state.status(), RequestStatus::Succeeded);
    assert_eq!(state.data(), Some(&serde_json::Value::Null));
}

#[tokio::test]
async fn second_send_clears_first_result_before_its_own_arrives() {
    let client = MockHttpClient::new();
    client.respond_with(json!({"name": "first"}));
    let second_gate = client.gate();
    let dispatcher = dispatcher(&client);
    let url = format!("{BASE}/ingredients.json");

    let mut first = dispatcher
        .send(&url, Method::Post, None, Some(json!("a")), Some("ADD"))
        .unwrap();
    first.wait_with_timeout(WAIT).await.unwrap();
    assert_eq!(dispatcher.snapshot().data(), Some(&json!({"name": "first"})));

    let mut second = dispatcher
        .send(&url, Method::Post, None, Some(json!("b")), Some("ADD"))
        .unwrap();
    let state = dispatcher.snapshot();
    assert!(state.is_loading());
    assert!(state.data().is_none());
    assert!(state.extra().is_none());

    second_gate.succeed(json!({"name": "second"}));
    second.wait_with_timeout(WAIT).await.unwrap();
    assert_eq!(dispatcher.snapshot().data(), Some(&json!({"name": "second"})));
    assert_eq!(dispatcher.snapshot().extra(), Some(&json!("b")));
}

#[tokio::test]
async fn reset_returns_to_idle_and_is_idempotent() {
    let client = MockHttpClient::new();
    client.fail_with(HttpError::Timeout);
    let dispatcher = dispatcher(&client);

    let mut ticket = dispatcher
        .send(&format!("{BASE}/ingredients.json"), Method::Get, None, None, Some("SEARCH"))
        .unwrap();
    ticket.wait_with_timeout(WAIT).await.unwrap();
    assert!(dispatcher.snapshot().error().is_some());

    dispatcher.reset().unwrap();
    let once = dispatcher.snapshot();
    dispatcher.reset().unwrap();

    assert_eq!(once.status(), RequestStatus::Idle);
    assert!(once.identifier().is_none());
    assert_eq!(once, dispatcher.snapshot());
}

// ============================================================================
// Supersession
// ============================================================================

#[tokio::test]
async fn last_resolved_wins_by_default() {
    let client = MockHttpClient::new();
    let slow = client.gate();
    let fast = client.gate();
    let dispatcher = dispatcher(&client);
    assert_eq!(dispatcher.policy(), SupersedePolicy::LastResolvedWins);
    let url = format!("{BASE}/ingredients.json");

    let mut first = dispatcher.send(&url, Method::Get, None, Some(json!(1)), None).unwrap();
    let mut second = dispatcher.send(&url, Method::Get, None, Some(json!(2)), None).unwrap();

    fast.succeed(json!("second"));
    second.wait_with_timeout(WAIT).await.unwrap();
    assert_eq!(dispatcher.snapshot().data(), Some(&json!("second")));

    slow.succeed(json!("first"));
    first.wait_with_timeout(WAIT).await.unwrap();

    // The earlier request resolved last, so its payload is what remains
    let state = dispatcher.snapshot();
    assert_eq!(state.data(), Some(&json!("first")));
    assert_eq!(state.extra(), Some(&json!(1)));
    assert_eq!(state.resolved(), Some(first.id()));
    assert!(state.is_stale());
}

#[tokio::test]
async fn latest_request_wins_drops_the_superseded_result() {
    let client = MockHttpClient::new();
    let slow = client.gate();
    let fast = client.gate();
    let dispatcher = dispatcher(&client).with_policy(SupersedePolicy::LatestRequestWins);
    let url = format!("{BASE}/ingredients.json");

    let mut first = dispatcher.send(&url, Method::Get, None, Some(json!(1)), None).unwrap();
    let mut second = dispatcher.send(&url, Method::Get, None, Some(json!(2)), None).unwrap();
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    fast.succeed(json!("second"));
    second.wait_with_timeout(WAIT).await.unwrap();
    slow.succeed(json!("first"));
    first.wait_with_timeout(WAIT).await.unwrap();

    let state = dispatcher.snapshot();
    assert_eq!(state.data(), Some(&json!("second")));
    assert_eq!(state.resolved(), Some(second.id()));
    assert!(!state.is_stale());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn superseded_result_racing_the_newer_send_is_dropped() {
    init_test_tracing();
    let url = format!("{BASE}/ingredients.json");

    for _ in 0..500 {
        let client = MockHttpClient::new();
        let older = client.gate();
        let _newer = client.gate();
        let dispatcher = RequestDispatcher::<serde_json::Value>::new(Arc::new(client.clone()))
            .with_policy(SupersedePolicy::LatestRequestWins);

        let mut first = dispatcher
            .send(&url, Method::Get, None, Some(json!("A")), Some("SEARCH"))
            .unwrap();
        older.succeed(json!("A"));
        let second = dispatcher
            .send(&url, Method::Get, None, Some(json!("B")), Some("SEARCH"))
            .unwrap();
        first.wait_with_timeout(WAIT).await.unwrap();

        // Whichever way the race went, the older payload is not shown under the newer send
        let state = dispatcher.snapshot();
        assert_eq!(state.issued(), Some(second.id()));
        assert!(state.is_loading());
        assert!(state.data().is_none());
        assert!(state.extra().is_none());
    }
}

#[tokio::test]
async fn cancelled_ticket_never_resolves_into_state() {
    let client = MockHttpClient::new();
    let gate = client.gate();
    let dispatcher = dispatcher(&client);

    let mut ticket = dispatcher
        .send(&format!("{BASE}/ingredients.json"), Method::Get, None, None, Some("SEARCH"))
        .unwrap();
    ticket.cancel();
    ticket.wait_with_timeout(WAIT).await.unwrap();
    gate.succeed(json!({"late": true}));

    let state = dispatcher.snapshot();
    assert!(state.is_loading());
    assert!(state.data().is_none());
    assert!(state.resolved().is_none());
}

// ============================================================================
// Observation
// ============================================================================

#[tokio::test]
async fn subscribers_see_loading_then_outcome() {
    let client = MockHttpClient::new();
    client.respond_with(json!({"name": "k9"}));
    let dispatcher = dispatcher(&client);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let id = dispatcher.subscribe(move |state| {
        sink.lock().unwrap().push((state.status(), state.identifier().map(String::from)));
    });

    let mut ticket = dispatcher
        .send(&format!("{BASE}/ingredients.json"), Method::Post, None, None, Some("ADD"))
        .unwrap();
    ticket.wait_with_timeout(WAIT).await.unwrap();
    dispatcher.unsubscribe(id);
    dispatcher.reset().unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            (RequestStatus::Loading, Some("ADD".to_string())),
            (RequestStatus::Succeeded, Some("ADD".to_string())),
        ]
    );
}

#[tokio::test]
async fn request_outliving_its_dispatcher_is_not_an_error() {
    let client = MockHttpClient::new();
    let gate = client.gate();
    let dispatcher = dispatcher(&client);

    let mut ticket = dispatcher
        .send(&format!("{BASE}/ingredients.json"), Method::Get, None, None, None)
        .unwrap();
    drop(dispatcher);

    gate.succeed(json!({}));
    ticket.wait_with_timeout(WAIT).await.unwrap();
}

#[tokio::test]
async fn shutdown_rejects_new_requests() {
    let client = MockHttpClient::new();
    let dispatcher = dispatcher(&client);

    dispatcher.shutdown(Duration::from_millis(100)).await.unwrap();
    let result = dispatcher.send(&format!("{BASE}/ingredients.json"), Method::Get, None, None, None);

    assert!(matches!(result, Err(pantry_http::DispatchError::Store(_))));
}
