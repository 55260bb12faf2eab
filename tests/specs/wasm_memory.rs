//! Growing and reading/writing a module's linear memory through the host
//! dispatcher, including the out-of-bounds edge case.

use serde_json::json;

use crate::prelude::{compile_args, Harness};

#[tokio::test]
async fn memory_grow_write_read_and_out_of_bounds() {
    let harness = Harness::start("[capabilities.wasm]\nload = true\nexecute = true\n").await;
    let wat = r#"(module (memory (export "memory") 1))"#;

    let compiled = harness.state.dispatcher.dispatch("compile", compile_args(wat)).await.expect("compile");
    let module_id = compiled["module_id"].clone();
    let instantiated = harness
        .state
        .dispatcher
        .dispatch("instantiate", json!({ "module_id": module_id }))
        .await
        .expect("instantiate");
    let instance_id = instantiated["instance_id"].clone();

    let size = harness
        .state
        .dispatcher
        .dispatch("memory_size", json!({ "instance_id": instance_id }))
        .await
        .expect("memory_size");
    assert_eq!(size["pages"], json!(1));

    let grown = harness
        .state
        .dispatcher
        .dispatch("memory_grow", json!({ "instance_id": instance_id, "pages": 1 }))
        .await
        .expect("memory_grow succeeds within the wasm32 max");
    assert_eq!(grown["previous_pages"], json!(1));

    let written = harness
        .state
        .dispatcher
        .dispatch(
            "memory_write",
            json!({ "instance_id": instance_id, "offset": 0, "data": base64_of(b"hi") }),
        )
        .await
        .expect("memory_write succeeds");
    assert!(written.is_null());

    let read = harness
        .state
        .dispatcher
        .dispatch("memory_read", json!({ "instance_id": instance_id, "offset": 0, "len": 2 }))
        .await
        .expect("memory_read succeeds");
    assert_eq!(read["data"], json!(base64_of(b"hi")));

    let oob = harness
        .state
        .dispatcher
        .dispatch(
            "memory_read",
            json!({ "instance_id": instance_id, "offset": 131072, "len": 1 }),
        )
        .await;
    assert!(oob.is_err(), "reading past the end of linear memory fails");
}

fn base64_of(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
