//! Integration tests for the subscription hub: fan-out, dispatch
//! isolation, send gating, and request correlation — all over the
//! in-memory transport, no network.

mod support;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use royaka::{
    Client, ClientBuilder, ReconnectPolicy, RequestError, Subscription,
};
use royaka_protocol::{
    kind, Envelope, FindMatchRequest, JsonCodec, LoginRequest, MatchMode,
};
use support::{next_handle, MemoryConnector, ServerHandle};
use tokio::sync::mpsc;

const LOGIN_RESPONSE_FRAME: &str = r#"{"type":"login_response","success":true,"data":{"session_id":"abc"}}"#;
const MARKER_FRAME: &str = r#"{"type":"marker"}"#;

fn test_builder() -> ClientBuilder {
    Client::builder().reconnect(ReconnectPolicy::Fixed {
        delay: Duration::from_millis(10),
    })
}

/// Starts a client over a fresh in-memory transport and waits for the
/// first connection.
async fn connected_client() -> (Client, ServerHandle) {
    let (connector, mut handles) = MemoryConnector::new(0);
    let client = test_builder().start_with(connector, JsonCodec);
    let handle = next_handle(&mut handles).await;
    assert!(
        tokio::time::timeout(
            Duration::from_secs(1),
            client.wait_until_connected()
        )
        .await
        .expect("timed out waiting for connect")
    );
    (client, handle)
}

/// Subscribes a listener that forwards every envelope into a channel.
fn collector(
    client: &Client,
) -> (Subscription, mpsc::UnboundedReceiver<Envelope>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sub = client.subscribe(move |envelope| {
        let _ = tx.send(envelope.clone());
    });
    (sub, rx)
}

async fn recv_one(
    rx: &mut mpsc::UnboundedReceiver<Envelope>,
) -> Envelope {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for envelope")
        .expect("listener channel closed")
}

// =========================================================================
// Fan-out
// =========================================================================

#[tokio::test]
async fn test_fanout_delivers_identical_envelope_to_all_subscribers_once()
{
    let (client, handle) = connected_client().await;
    let (_sub_a, mut rx_a) = collector(&client);
    let (_sub_b, mut rx_b) = collector(&client);

    assert!(handle.push(LOGIN_RESPONSE_FRAME));
    // The marker frame bounds the assertion: if either listener had
    // been invoked twice for the login_response, the duplicate would
    // arrive before the marker.
    assert!(handle.push(MARKER_FRAME));

    for rx in [&mut rx_a, &mut rx_b] {
        let first = recv_one(rx).await;
        assert_eq!(first.kind, kind::LOGIN_RESPONSE);
        assert_eq!(first.success, Some(true));
        assert_eq!(
            first.data.as_ref().unwrap()["session_id"],
            "abc"
        );

        let second = recv_one(rx).await;
        assert_eq!(second.kind, "marker");
    }
}

#[tokio::test]
async fn test_unsubscribed_listener_stops_receiving() {
    // The §8 scenario: A and B receive, A unsubscribes, only B
    // receives the next message.
    let (client, handle) = connected_client().await;
    let (sub_a, mut rx_a) = collector(&client);
    let (_sub_b, mut rx_b) = collector(&client);

    assert!(handle.push(LOGIN_RESPONSE_FRAME));
    assert_eq!(recv_one(&mut rx_a).await.kind, kind::LOGIN_RESPONSE);
    assert_eq!(recv_one(&mut rx_b).await.kind, kind::LOGIN_RESPONSE);

    sub_a.unsubscribe();
    assert!(handle.push(MARKER_FRAME));

    assert_eq!(recv_one(&mut rx_b).await.kind, "marker");
    // A's channel saw nothing after the unsubscribe.
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_panicking_listener_does_not_block_siblings() {
    let (client, handle) = connected_client().await;

    // Registered first, so it runs first in every dispatch pass.
    let _bad = client.subscribe(|_| panic!("listener bug"));
    let (_sub_b, mut rx_b) = collector(&client);

    assert!(handle.push(LOGIN_RESPONSE_FRAME));

    let received = recv_one(&mut rx_b).await;
    assert_eq!(received.kind, kind::LOGIN_RESPONSE);

    // The hub survives: a second message still flows.
    assert!(handle.push(MARKER_FRAME));
    assert_eq!(recv_one(&mut rx_b).await.kind, "marker");
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_listener_unsubscribing_itself_mid_dispatch() {
    let (client, handle) = connected_client().await;

    // A unsubscribes itself while handling its first envelope. The
    // subscription guard is handed in after registration via a slot.
    let slot: Arc<Mutex<Option<Subscription>>> =
        Arc::new(Mutex::new(None));
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let sub_a = client.subscribe({
        let slot = Arc::clone(&slot);
        move |envelope: &Envelope| {
            let _ = tx_a.send(envelope.clone());
            drop(slot.lock().unwrap().take());
        }
    });
    *slot.lock().unwrap() = Some(sub_a);

    let (_sub_b, mut rx_b) = collector(&client);

    assert!(handle.push(LOGIN_RESPONSE_FRAME));

    // A was in the snapshot, so it still sees this message...
    assert_eq!(recv_one(&mut rx_a).await.kind, kind::LOGIN_RESPONSE);
    // ...and B is not skipped despite the registry mutating mid-pass.
    assert_eq!(recv_one(&mut rx_b).await.kind, kind::LOGIN_RESPONSE);

    // From the next message on, A is gone.
    assert!(handle.push(MARKER_FRAME));
    assert_eq!(recv_one(&mut rx_b).await.kind, "marker");
    assert!(rx_a.try_recv().is_err());
}

#[tokio::test]
async fn test_two_messages_dispatch_without_interleaving() {
    // All listeners see message 1 before any listener sees message 2.
    let (client, handle) = connected_client().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub_a = client.subscribe({
        let tx = tx.clone();
        move |envelope: &Envelope| {
            let _ = tx.send(('a', envelope.kind.clone()));
        }
    });
    let _sub_b = client.subscribe({
        let tx = tx.clone();
        move |envelope: &Envelope| {
            let _ = tx.send(('b', envelope.kind.clone()));
        }
    });

    assert!(handle.push(r#"{"type":"game_state"}"#));
    assert!(handle.push(r#"{"type":"mana_update"}"#));

    let mut events = Vec::new();
    for _ in 0..4 {
        let event =
            tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timed out")
                .expect("channel closed");
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            ('a', "game_state".to_string()),
            ('b', "game_state".to_string()),
            ('a', "mana_update".to_string()),
            ('b', "mana_update".to_string()),
        ]
    );
}

// =========================================================================
// Decode robustness
// =========================================================================

#[tokio::test]
async fn test_malformed_frame_is_dropped_without_invocations() {
    let (client, handle) = connected_client().await;
    let (_sub, mut rx) = collector(&client);

    assert!(handle.push("{definitely not json"));
    assert!(handle.push(MARKER_FRAME));

    // The first thing any listener sees is the marker: the malformed
    // frame produced zero invocations and didn't kill the connection.
    assert_eq!(recv_one(&mut rx).await.kind, "marker");
    assert!(client.is_connected());
}

// =========================================================================
// Send gating
// =========================================================================

#[tokio::test]
async fn test_send_while_disconnected_writes_nothing() {
    // The §8 scenario: find_match sent while the endpoint is down.
    let (connector, mut handles) = MemoryConnector::new(u32::MAX);
    let client = test_builder().start_with(connector, JsonCodec);

    assert!(!client.is_connected());
    let envelope = Envelope::request(
        kind::FIND_MATCH,
        &FindMatchRequest {
            username: "alice".into(),
            mode: MatchMode::Simple,
        },
    )
    .unwrap();
    client.send_message(envelope);

    // Give the manager a few retry cycles; no connection (and hence no
    // write) may ever materialize.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(handles.try_recv().is_err());
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_send_while_connected_writes_encoded_frame() {
    let (client, mut handle) = connected_client().await;

    let envelope = Envelope::request(
        kind::FIND_MATCH,
        &FindMatchRequest {
            username: "alice".into(),
            mode: MatchMode::Simple,
        },
    )
    .unwrap();
    client.send_message(envelope);

    let text = handle.next_sent().await.expect("frame should be written");
    assert!(
        !text.contains("success"),
        "outbound frames must omit verdict fields, got: {text}"
    );
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["type"], "find_match");
    assert_eq!(value["data"]["username"], "alice");
    assert_eq!(value["data"]["mode"], "simple");
}

// =========================================================================
// Request correlation
// =========================================================================

#[tokio::test]
async fn test_request_resolves_on_matching_reply() {
    let (client, mut handle) = connected_client().await;

    let server = tokio::spawn(async move {
        let sent = handle.next_sent().await.expect("request frame");
        let envelope: Envelope = serde_json::from_str(&sent).unwrap();
        assert_eq!(envelope.kind, kind::LOGIN);
        assert!(handle.push(LOGIN_RESPONSE_FRAME));
        handle // keep the connection alive until joined
    });

    let login = Envelope::request(
        kind::LOGIN,
        &LoginRequest {
            username: "alice".into(),
            password: "hunter2".into(),
        },
    )
    .unwrap();
    let reply = client
        .request(login, Duration::from_secs(1))
        .await
        .expect("request should resolve");

    assert_eq!(reply.kind, kind::LOGIN_RESPONSE);
    assert!(reply.is_ok());
    let _handle = server.await.unwrap();
}

#[tokio::test]
async fn test_request_ignores_other_kinds_while_waiting() {
    let (client, mut handle) = connected_client().await;

    let server = tokio::spawn(async move {
        let _ = handle.next_sent().await.expect("request frame");
        // Noise first, then the real reply.
        assert!(handle.push(r#"{"type":"mana_update"}"#));
        assert!(handle.push(r#"{"type":"game_state"}"#));
        assert!(handle.push(
            r#"{"type":"skip_turn_response","success":true}"#
        ));
        handle
    });

    let skip = Envelope::request(
        kind::SKIP_TURN,
        &royaka_protocol::SkipTurnRequest {
            room_id: "room-7".into(),
            username: "alice".into(),
        },
    )
    .unwrap();
    let reply = client
        .request(skip, Duration::from_secs(1))
        .await
        .expect("request should resolve");

    assert_eq!(reply.kind, kind::SKIP_TURN_RESPONSE);
    let _handle = server.await.unwrap();
}

#[tokio::test]
async fn test_request_times_out_when_server_is_silent() {
    let (client, handle) = connected_client().await;

    let result = client
        .request(Envelope::bare(kind::GET_DESK), Duration::from_millis(50))
        .await;

    assert!(matches!(
        result,
        Err(RequestError::Timeout { kind }) if kind == kind::DECK_RESPONSE
    ));
    drop(handle);
}

#[tokio::test]
async fn test_request_while_disconnected_fails_fast() {
    let (connector, _handles) = MemoryConnector::new(u32::MAX);
    let client = test_builder().start_with(connector, JsonCodec);

    let result = client
        .request(Envelope::bare(kind::GET_DESK), Duration::from_secs(1))
        .await;

    assert!(matches!(result, Err(RequestError::NotConnected)));
}

#[tokio::test]
async fn test_request_rejects_fire_and_forget_kind() {
    let (client, handle) = connected_client().await;

    let envelope = Envelope::request(
        kind::FIND_MATCH,
        &FindMatchRequest {
            username: "alice".into(),
            mode: MatchMode::Enhanced,
        },
    )
    .unwrap();
    let result = client.request(envelope, Duration::from_secs(1)).await;

    assert!(matches!(
        result,
        Err(RequestError::NoReply { kind }) if kind == kind::FIND_MATCH
    ));
    drop(handle);
}

#[tokio::test]
async fn test_wait_for_resolves_on_unsolicited_push() {
    let (client, handle) = connected_client().await;

    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.push(
            r#"{"type":"match_found","success":true,"data":{"room_id":"room-7"}}"#
        ));
        handle
    });

    let push = client
        .wait_for(kind::MATCH_FOUND, Duration::from_secs(1))
        .await
        .expect("push should arrive");

    let data: royaka_protocol::MatchFoundData = push.data_as().unwrap();
    assert_eq!(data.room_id, "room-7");
    let _handle = server.await.unwrap();
}
