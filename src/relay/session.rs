// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Per-connection session loop (the rest of component C7).
//!
//! Grounded on the teacher's `InternalLocalRelay::handle_connection`: a
//! `tokio::select!` between inbound client frames, outbound messages
//! queued by the subscription registry, and a shutdown signal.

use futures_util::{SinkExt, StreamExt};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::Relay;
use crate::event::Event;
use crate::message::{ClientMessage, RelayMessage};
use crate::registry::ConnectionId;

/// Run one client connection to completion: accept the WebSocket upgrade,
/// then dispatch frames until the client disconnects or the relay shuts
/// down. Errors here never propagate beyond this connection (§7).
pub async fn handle_connection(
    relay: std::sync::Arc<Relay>,
    stream: TcpStream,
    conn_id: ConnectionId,
    mut shutdown: broadcast::Receiver<()>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(err) => {
            tracing::debug!(?err, "websocket handshake failed");
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelayMessage>();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.recv() => {
                break;
            }

            outgoing = rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        if write.send(WsMessage::Text(msg.to_json())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = read.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_frame(&relay, conn_id, &text, &tx).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::debug!(?err, "transport error, tearing down connection");
                        break;
                    }
                }
            }
        }
    }

    relay.registry.remove(conn_id).await;
}

async fn handle_frame(
    relay: &Relay,
    conn_id: ConnectionId,
    text: &str,
    tx: &mpsc::UnboundedSender<RelayMessage>,
) {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(err) => {
            tracing::debug!(?err, "malformed frame, skipping");
            let _ = tx.send(RelayMessage::notice("unknown command"));
            return;
        }
    };

    match message {
        ClientMessage::Event(raw) => handle_event(relay, &raw, tx).await,
        ClientMessage::Req {
            subscription_id,
            filters,
        } => handle_req(relay, conn_id, subscription_id, filters, tx).await,
        ClientMessage::Close { subscription_id: _ } => {
            relay.registry.remove(conn_id).await;
        }
    }
}

async fn handle_event(relay: &Relay, raw: &serde_json::Value, tx: &mpsc::UnboundedSender<RelayMessage>) {
    let event = match Event::parse_with_best_effort_id(raw) {
        Ok(event) => event,
        Err((err, id)) => {
            let reply_id = id.map(|id| id.to_hex()).unwrap_or_else(|| failure_echo_id(raw));
            let _ = tx.send(RelayMessage::ok(reply_id, false, err.to_string()));
            return;
        }
    };

    let id_hex = event.id().to_hex();

    // Persist first, broadcast only after the commit succeeds (§4.7, §9):
    // late subscribers must never observe an event that isn't durable yet.
    if let Err(err) = relay.store.insert(event.clone()).await {
        let _ = tx.send(RelayMessage::notice(format!("store error: {err}")));
        return;
    }

    relay.registry.broadcast(&event).await;

    let _ = tx.send(RelayMessage::ok(id_hex, true, ""));
}

async fn handle_req(
    relay: &Relay,
    conn_id: ConnectionId,
    subscription_id: String,
    filters: Vec<crate::filter::Filter>,
    tx: &mpsc::UnboundedSender<RelayMessage>,
) {
    // Attach before querying: no event persisted after this point can be
    // missed, even though it may also show up once more in the backfill
    // results the relay does not deduplicate (§4.7).
    relay
        .registry
        .add(conn_id, subscription_id.clone(), filters.clone(), tx.clone())
        .await;

    match relay.store.query(&filters, relay.default_backfill_limit).await {
        Ok(events) => {
            for event in events {
                let _ = tx.send(RelayMessage::event(subscription_id.clone(), event));
            }
            let _ = tx.send(RelayMessage::eose(subscription_id));
        }
        Err(err) => {
            let _ = tx.send(RelayMessage::notice(format!("store error: {err}")));
        }
    }
}

/// When an event fails validation badly enough that no id could be
/// computed at all, echo an opaque placeholder instead (SPEC_FULL §C.1).
fn failure_echo_id(raw: &serde_json::Value) -> String {
    if let Some(id) = raw.get("id").and_then(serde_json::Value::as_str) {
        if id.len() == 64 && hex::decode(id).is_ok() {
            return id.to_lowercase();
        }
    }

    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut hasher = Sha256::new();
    hasher.update(raw.to_string().as_bytes());
    hasher.update(salt);
    hex::encode(hasher.finalize())
}
