//! A guest watches a directory, writes a file into it, and observes the
//! resulting filesystem event before tearing the watch down.

use serde_json::json;

use crate::prelude::Harness;

#[tokio::test]
async fn watch_reports_a_create_event_then_closes_cleanly() {
    let harness = Harness::start(
        "[capabilities.fs]\nread = [\"./watched/**\"]\nwrite = [\"./watched/**\"]\n",
    )
    .await;
    let watched = harness.root().join("watched");
    std::fs::create_dir_all(&watched).expect("create watched dir");

    let watch = harness
        .state
        .dispatcher
        .dispatch("watch", json!({ "path": watched.to_string_lossy(), "recursive": false }))
        .await
        .expect("watch succeeds");
    let rid = watch["rid"].clone();

    std::fs::write(watched.join("hello.txt"), b"hi").expect("write file");

    let event = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        harness.state.dispatcher.dispatch("watch_next", json!({ "rid": rid })),
    )
    .await
    .expect("watch_next does not time out")
    .expect("watch_next succeeds");
    assert!(event.get("kind").is_some(), "event has a kind field: {event:?}");

    harness
        .state
        .dispatcher
        .dispatch("watch_close", json!({ "rid": rid.clone() }))
        .await
        .expect("watch_close succeeds");

    let after_close = harness.state.dispatcher.dispatch("watch_next", json!({ "rid": rid })).await;
    assert!(after_close.is_err(), "a closed watch rejects further polls");
}

#[tokio::test]
async fn diagnostics_reports_the_watch_overflow_counter() {
    let harness = Harness::start(
        "[capabilities.fs]\nread = [\"./watched/**\"]\nwrite = [\"./watched/**\"]\n",
    )
    .await;
    let watched = harness.root().join("watched");
    std::fs::create_dir_all(&watched).expect("create watched dir");

    let watch = harness
        .state
        .dispatcher
        .dispatch("watch", json!({ "path": watched.to_string_lossy(), "recursive": false }))
        .await
        .expect("watch succeeds");
    let rid = watch["rid"].clone();

    let diagnostics = harness
        .state
        .dispatcher
        .dispatch("diagnostics", json!({ "rid": rid }))
        .await
        .expect("diagnostics succeeds for a live watch handle");
    assert_eq!(diagnostics["overflow_count"], json!(0));
}

#[tokio::test]
async fn diagnostics_rejects_a_handle_that_is_not_receiver_backed() {
    let harness = Harness::start("").await;
    let err = harness
        .state
        .dispatcher
        .dispatch("diagnostics", json!({ "rid": 0 }))
        .await
        .expect_err("no resource has ever been inserted into this table");
    assert_eq!(err.kind, "Generic");
}
