// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! End-to-end scenarios (spec §8), driven over a real loopback WebSocket
//! connection against a [`nostr_relay::mock::MockRelay`].

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use nostr_relay::canonical;
use nostr_relay::event::Kind;
use nostr_relay::keys::Keys;
use nostr_relay::mock::MockRelay;
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(relay: &MockRelay) -> WsStream {
    let (stream, _) = connect_async(relay.url()).await.expect("client connects");
    stream
}

fn signed_event_json(keys: &Keys, kind: u64, tags: Vec<Vec<String>>, content: &str, created_at: u64) -> Value {
    let pubkey_hex = keys.public_key().to_hex();
    let k = Kind::new(kind);
    let id_bytes = canonical::compute_id(&pubkey_hex, created_at, k, &tags, content);
    let sig = keys.sign_schnorr(&id_bytes);
    json!({
        "id": hex::encode(id_bytes),
        "pubkey": pubkey_hex,
        "created_at": created_at,
        "kind": kind,
        "tags": tags,
        "content": content,
        "sig": sig.to_hex(),
    })
}

async fn send(ws: &mut WsStream, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn recv_json(ws: &mut WsStream) -> Value {
    let msg = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("did not receive a reply in time")
        .expect("stream ended")
        .expect("transport error");
    let text = msg.into_text().unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn publish_and_fetch() {
    let relay = MockRelay::run().await.unwrap();
    let keys = Keys::generate();
    let mut ws = connect(&relay).await;

    let event = signed_event_json(&keys, 1, vec![], "hello", 1_700_000_000);
    send(&mut ws, json!(["EVENT", event])).await;
    let ok = recv_json(&mut ws).await;
    assert_eq!(ok[0], "OK");
    assert_eq!(ok[2], "true");

    send(
        &mut ws,
        json!(["REQ", "sub1", {"authors": [keys.public_key().to_hex()]}]),
    )
    .await;

    let event_frame = recv_json(&mut ws).await;
    assert_eq!(event_frame[0], "EVENT");
    assert_eq!(event_frame[1], "sub1");
    assert_eq!(event_frame[2]["content"], "hello");

    let eose = recv_json(&mut ws).await;
    assert_eq!(eose, json!(["EOSE", "sub1"]));
}

#[tokio::test]
async fn invalid_signature_rejected() {
    let relay = MockRelay::run().await.unwrap();
    let keys = Keys::generate();
    let mut ws = connect(&relay).await;

    let mut event = signed_event_json(&keys, 1, vec![], "hello", 1_700_000_000);
    let sig = event["sig"].as_str().unwrap().to_owned();
    let mut bytes = hex::decode(&sig).unwrap();
    bytes[0] ^= 0xff;
    event["sig"] = json!(hex::encode(bytes));

    send(&mut ws, json!(["EVENT", event])).await;
    let ok = recv_json(&mut ws).await;
    assert_eq!(ok[0], "OK");
    assert_eq!(ok[2], "false");

    // the rejected event must never be delivered to any subscription
    let mut listener = connect(&relay).await;
    send(
        &mut listener,
        json!(["REQ", "sub1", {"authors": [keys.public_key().to_hex()]}]),
    )
    .await;
    let eose = recv_json(&mut listener).await;
    assert_eq!(eose, json!(["EOSE", "sub1"]));
}

#[tokio::test]
async fn metadata_replacement() {
    let relay = MockRelay::run().await.unwrap();
    let keys = Keys::generate();
    let mut ws = connect(&relay).await;

    let first = signed_event_json(&keys, 0, vec![], r#"{"name":"a"}"#, 1_700_000_000);
    send(&mut ws, json!(["EVENT", first])).await;
    recv_json(&mut ws).await;

    let second = signed_event_json(&keys, 0, vec![], r#"{"name":"b"}"#, 1_700_000_001);
    send(&mut ws, json!(["EVENT", second])).await;
    recv_json(&mut ws).await;

    send(
        &mut ws,
        json!(["REQ", "sub1", {"authors": [keys.public_key().to_hex()], "kinds": [0]}]),
    )
    .await;
    let event_frame = recv_json(&mut ws).await;
    assert_eq!(event_frame[2]["content"], r#"{"name":"b"}"#);
    let eose = recv_json(&mut ws).await;
    assert_eq!(eose, json!(["EOSE", "sub1"]));
}

#[tokio::test]
async fn nip09_deletion() {
    let relay = MockRelay::run().await.unwrap();
    let sk1 = Keys::generate();
    let sk2 = Keys::generate();
    let mut ws = connect(&relay).await;

    let e1 = signed_event_json(&sk1, 1, vec![], "first", 1_700_000_000);
    let e1_id = e1["id"].as_str().unwrap().to_owned();
    send(&mut ws, json!(["EVENT", e1])).await;
    recv_json(&mut ws).await;

    let e2 = signed_event_json(&sk1, 1, vec![], "second", 1_700_000_001);
    let e2_id = e2["id"].as_str().unwrap().to_owned();
    send(&mut ws, json!(["EVENT", e2])).await;
    recv_json(&mut ws).await;

    let deletion = signed_event_json(&sk1, 5, vec![vec!["e".into(), e1_id.clone()]], "", 1_700_000_002);
    send(&mut ws, json!(["EVENT", deletion])).await;
    recv_json(&mut ws).await;

    send(&mut ws, json!(["REQ", "sub1", {"authors": [sk1.public_key().to_hex()]}])).await;
    let event_frame = recv_json(&mut ws).await;
    assert_eq!(event_frame[2]["id"], e2_id);
    let eose = recv_json(&mut ws).await;
    assert_eq!(eose, json!(["EOSE", "sub1"]));

    // a deletion from a different key targeting e2 must not remove it
    let foreign_deletion = signed_event_json(&sk2, 5, vec![vec!["e".into(), e2_id.clone()]], "", 1_700_000_003);
    send(&mut ws, json!(["EVENT", foreign_deletion])).await;
    recv_json(&mut ws).await;

    send(&mut ws, json!(["REQ", "sub2", {"authors": [sk1.public_key().to_hex()]}])).await;
    let event_frame = recv_json(&mut ws).await;
    assert_eq!(event_frame[2]["id"], e2_id, "e2 must survive a deletion signed by someone else");
}

#[tokio::test]
async fn live_broadcast_with_filter() {
    let relay = MockRelay::run().await.unwrap();
    let mut client_a = connect(&relay).await;
    let mut client_b = connect(&relay).await;
    let mut client_c = connect(&relay).await;

    send(&mut client_a, json!(["REQ", "subA", {"kinds": [1], "since": 1_700_000_000u64}])).await;
    assert_eq!(recv_json(&mut client_a).await, json!(["EOSE", "subA"]));

    send(&mut client_c, json!(["REQ", "subC", {"kinds": [2]}])).await;
    assert_eq!(recv_json(&mut client_c).await, json!(["EOSE", "subC"]));

    let keys = Keys::generate();
    let event = signed_event_json(&keys, 1, vec![], "live", 1_700_000_005);
    send(&mut client_b, json!(["EVENT", event])).await;
    recv_json(&mut client_b).await; // OK

    let delivered = recv_json(&mut client_a).await;
    assert_eq!(delivered[0], "EVENT");
    assert_eq!(delivered[1], "subA");
    assert_eq!(delivered[2]["content"], "live");

    // client C's kind=2 subscription must not receive the kind=1 event
    let nothing = timeout(Duration::from_millis(300), client_c.next()).await;
    assert!(nothing.is_err(), "client C should not have received anything");
}

#[tokio::test]
async fn multi_filter_or() {
    let relay = MockRelay::run().await.unwrap();
    let mut ws = connect(&relay).await;
    let publisher = Keys::generate();
    let tagged_pubkey = Keys::generate().public_key().to_hex();

    send(
        &mut ws,
        json!([
            "REQ",
            "sub1",
            {"kinds": [0]},
            {"#p": [tagged_pubkey.clone()]}
        ]),
    )
    .await;
    assert_eq!(recv_json(&mut ws).await, json!(["EOSE", "sub1"]));

    let kind0 = signed_event_json(&publisher, 0, vec![], "{}", 1_700_000_000);
    send(&mut ws, json!(["EVENT", kind0])).await;
    let delivered = recv_json(&mut ws).await; // EVENT broadcast, enqueued before the OK
    assert_eq!(delivered[0], "EVENT");
    recv_json(&mut ws).await; // OK

    let tagged = signed_event_json(
        &publisher,
        1,
        vec![vec!["p".into(), tagged_pubkey]],
        "mentioning you",
        1_700_000_001,
    );
    send(&mut ws, json!(["EVENT", tagged])).await;
    let delivered = recv_json(&mut ws).await; // EVENT broadcast, enqueued before the OK
    assert_eq!(delivered[0], "EVENT");
    assert_eq!(delivered[2]["content"], "mentioning you");
    recv_json(&mut ws).await; // OK

    let unrelated = signed_event_json(&publisher, 1, vec![], "nothing to see", 1_700_000_002);
    send(&mut ws, json!(["EVENT", unrelated])).await;
    recv_json(&mut ws).await;
    let nothing = timeout(Duration::from_millis(300), ws.next()).await;
    assert!(nothing.is_err(), "unrelated event must not match either filter");
}
