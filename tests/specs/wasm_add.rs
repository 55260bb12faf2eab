//! Compile a trivial module through the host dispatcher, instantiate it,
//! and call its exported function.

use serde_json::json;

use crate::prelude::{compile_args, Harness};

#[tokio::test]
async fn compiling_through_the_host_dispatcher_respects_the_wasm_capability() {
    let harness = Harness::start("[capabilities.wasm]\nload = true\nexecute = true\n").await;
    let wat = r#"(module
        (func $add (param $a i32) (param $b i32) (result i32)
            local.get $a
            local.get $b
            i32.add)
        (export "add" (func $add)))"#;

    let compiled = harness
        .state
        .dispatcher
        .dispatch("compile", compile_args(wat))
        .await
        .expect("compile succeeds");
    let module_id = compiled["module_id"].clone();

    let instantiated = harness
        .state
        .dispatcher
        .dispatch("instantiate", json!({ "module_id": module_id }))
        .await
        .expect("instantiate succeeds");
    let instance_id = instantiated["instance_id"].clone();

    let result = harness
        .state
        .dispatcher
        .dispatch(
            "call",
            json!({
                "instance_id": instance_id,
                "name": "add",
                "args": [{"type": "i32", "value": 20}, {"type": "i32", "value": 22}],
            }),
        )
        .await
        .expect("call succeeds");
    assert_eq!(result["values"], json!([{"type": "i32", "value": 42}]));
}

#[tokio::test]
async fn loading_wasm_without_the_load_capability_is_denied() {
    let harness = Harness::start("[capabilities.wasm]\nload = false\n").await;
    let wat = r#"(module (func $noop))"#;

    let err = harness
        .state
        .dispatcher
        .dispatch("compile", compile_args(wat))
        .await
        .expect_err("compile without wasm.load grant is denied");
    assert_eq!(err.kind, "PermissionDenied");
}
