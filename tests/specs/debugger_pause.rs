//! Pause/resume/step ops are rejected before a connection exists, and the
//! pause-event receiver can be created and drained independently of a
//! live CDP connection.

use serde_json::json;

use crate::prelude::Harness;

#[tokio::test]
async fn pausing_without_a_connection_reports_not_connected() {
    let harness = Harness::start("").await;

    let err = harness.state.dispatcher.dispatch("pause", json!({})).await.expect_err("pause requires a connection");
    assert_eq!(err.kind, "NotConnected");

    let err = harness.state.dispatcher.dispatch("resume", json!({})).await.expect_err("resume requires a connection");
    assert_eq!(err.kind, "NotConnected");

    let err = harness
        .state
        .dispatcher
        .dispatch("step_over", json!({}))
        .await
        .expect_err("stepping requires a paused session");
    assert_eq!(err.kind, "StepFailed");
}

#[tokio::test]
async fn a_pause_receiver_can_be_created_before_any_connection_exists() {
    let harness = Harness::start("").await;

    let created = harness
        .state
        .dispatcher
        .dispatch("create_pause_receiver", json!({}))
        .await
        .expect("creating a receiver does not require a live connection");
    assert!(created["rid"].is_u64());
}

#[tokio::test]
async fn debugger_ops_are_ungated_by_capability_policy() {
    // No [capabilities] table at all: every fs/net/process op would be
    // denied by default, but the debugger family has no capability kind
    // of its own (open question, see DESIGN.md) and must still dispatch.
    let harness = Harness::start("").await;

    let result = harness
        .state
        .dispatcher
        .dispatch("is_connected", json!({}))
        .await
        .expect("debugger ops dispatch without any capability grant");
    assert_eq!(result["connected"], json!(false));
}
