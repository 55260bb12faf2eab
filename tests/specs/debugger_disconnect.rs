//! Connects to a fake CDP endpoint, issues a `pause` request, then drops
//! the socket before replying. The driver task must observe the closed
//! socket, fail the in-flight request with `ConnectionFailed`, and leave
//! the session ready to accept a fresh `connect`.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use crate::prelude::Harness;

/// Accepts one connection, answers `Debugger.enable`/`Runtime.enable` so
/// the driver's handshake completes, then reads one more request and
/// closes without replying.
async fn fake_cdp_server_that_drops_after_handshake(listener: TcpListener) {
    let (stream, _) = listener.accept().await.expect("accept connection");
    let mut ws = tokio_tungstenite::accept_async(stream).await.expect("ws handshake");

    for _ in 0..2 {
        let msg = ws.next().await.expect("peer sends a request").expect("valid frame");
        let text = match msg {
            Message::Text(t) => t.to_string(),
            other => panic!("expected a text frame, got {other:?}"),
        };
        let req: Value = serde_json::from_str(&text).expect("json frame");
        let reply = json!({ "id": req["id"], "result": {} });
        ws.send(Message::Text(reply.to_string().into())).await.expect("send reply");
    }

    // One more request arrives (the guest's `pause`); drop the socket
    // instead of answering it.
    let _ = ws.next().await;
    drop(ws);
}

#[tokio::test]
async fn a_request_in_flight_when_the_peer_disconnects_resolves_as_connection_failed() {
    let harness = Harness::start("").await;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(fake_cdp_server_that_drops_after_handshake(listener));

    harness
        .state
        .dispatcher
        .dispatch("connect", json!({ "url": format!("ws://{addr}/") }))
        .await
        .expect("handshake completes against the fake server");

    let connected = harness.state.dispatcher.dispatch("is_connected", json!({})).await.expect("dispatches");
    assert_eq!(connected["connected"], json!(true));

    let err = tokio::time::timeout(Duration::from_secs(5), harness.state.dispatcher.dispatch("pause", json!({})))
        .await
        .expect("pause does not hang")
        .expect_err("the peer closes before replying");
    assert_eq!(err.kind, "ConnectionFailed");
    assert_eq!(err.code, 9601);

    let connected = harness.state.dispatcher.dispatch("is_connected", json!({})).await.expect("dispatches");
    assert_eq!(connected["connected"], json!(false));

    // Disconnecting an already-disconnected session is a harmless no-op.
    harness.state.dispatcher.dispatch("disconnect", json!({})).await.expect("disconnect succeeds");
}
