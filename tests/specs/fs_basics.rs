//! `read_dir` returns each entry's kind and size, not just its name, so a
//! guest can tell files from subdirectories without a follow-up `stat`.

use serde_json::json;

use crate::prelude::Harness;

#[tokio::test]
async fn read_dir_reports_kind_and_size_per_entry() {
    let harness = Harness::start("[capabilities.fs]\nread = [\"./data/**\"]\n").await;
    let data_dir = harness.root().join("data");
    std::fs::create_dir_all(data_dir.join("sub")).expect("create nested dir");
    std::fs::write(data_dir.join("a.txt"), "hello").expect("write file");

    let entries = harness
        .state
        .dispatcher
        .dispatch("read_dir", json!({ "path": data_dir.to_string_lossy() }))
        .await
        .expect("read_dir succeeds");
    let entries = entries.as_array().expect("read_dir returns an array");
    assert_eq!(entries.len(), 2);

    let file = entries.iter().find(|e| e["name"] == "a.txt").expect("a.txt entry present");
    assert_eq!(file["is_file"], json!(true));
    assert_eq!(file["is_dir"], json!(false));
    assert_eq!(file["is_symlink"], json!(false));
    assert_eq!(file["size"], json!(5));

    let sub = entries.iter().find(|e| e["name"] == "sub").expect("sub entry present");
    assert_eq!(sub["is_dir"], json!(true));
    assert_eq!(sub["is_file"], json!(false));
}
