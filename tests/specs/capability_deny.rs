//! A manifest grants `fs.read` over one subdirectory; a guest that tries
//! to climb back out of it with `..` is denied before any file I/O runs.

use serde_json::json;

use crate::prelude::Harness;

#[tokio::test]
async fn reading_inside_the_granted_directory_succeeds() {
    let harness = Harness::start("[capabilities.fs]\nread = [\"./data/**\"]\n").await;
    let data_dir = harness.root().join("data");
    std::fs::create_dir_all(&data_dir).expect("create data dir");
    std::fs::write(data_dir.join("ok.txt"), "fine").expect("write file");

    let result = harness
        .state
        .dispatcher
        .dispatch("read_text", json!({ "path": data_dir.join("ok.txt").to_string_lossy() }))
        .await
        .expect("read inside granted directory succeeds");
    assert_eq!(result, json!("fine"));
}

#[tokio::test]
async fn a_relative_traversal_out_of_the_granted_directory_is_denied() {
    let harness = Harness::start("[capabilities.fs]\nread = [\"./data/**\"]\n").await;
    let data_dir = harness.root().join("data");
    std::fs::create_dir_all(&data_dir).expect("create data dir");
    std::fs::write(harness.root().join("secret.txt"), "top secret").expect("write secret");

    let escape_path = data_dir.join("..").join("secret.txt");
    let err = harness
        .state
        .dispatcher
        .dispatch("read_text", json!({ "path": escape_path.to_string_lossy() }))
        .await
        .expect_err("traversal outside the granted glob is denied");
    assert_eq!(err.kind, "PermissionDenied");
    assert_eq!(err.code, 3001);
}

#[tokio::test]
async fn a_single_star_grant_does_not_reach_into_a_nested_directory() {
    let harness = Harness::start("[capabilities.fs]\nread = [\"./data/*\"]\n").await;
    let data_dir = harness.root().join("data");
    let nested_dir = data_dir.join("nested");
    std::fs::create_dir_all(&nested_dir).expect("create nested dir");
    std::fs::write(data_dir.join("ok.txt"), "fine").expect("write top-level file");
    std::fs::write(nested_dir.join("ok.txt"), "fine").expect("write nested file");

    harness
        .state
        .dispatcher
        .dispatch("read_text", json!({ "path": data_dir.join("ok.txt").to_string_lossy() }))
        .await
        .expect("single star grants the top-level file");

    let err = harness
        .state
        .dispatcher
        .dispatch("read_text", json!({ "path": nested_dir.join("ok.txt").to_string_lossy() }))
        .await
        .expect_err("single star must not cross a path separator");
    assert_eq!(err.kind, "PermissionDenied");
}

#[tokio::test]
async fn an_absolute_path_outside_any_grant_is_denied() {
    let harness = Harness::start("[capabilities.fs]\nread = [\"./data/**\"]\n").await;

    let err = harness
        .state
        .dispatcher
        .dispatch("read_text", json!({ "path": "/etc/passwd" }))
        .await
        .expect_err("ungranted absolute path is denied");
    assert_eq!(err.kind, "PermissionDenied");
}
