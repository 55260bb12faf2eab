// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-wasm: the WASM Service. Compiles, instantiates, and calls into
//! guest-supplied WebAssembly modules via `wasmtime`, with WASI preview1
//! support gated per-preopen through the same capability policy every
//! other service checks (§4.5, §6 `compile/instantiate/call/...`).

mod error;
mod handlers;
mod instance;
mod module;
mod runtime;
mod value;
mod wasi_ctx;

pub use error::WasmError;
pub use handlers::register;
pub use instance::WasmInstance;
pub use module::WasmModule;
pub use runtime::WasmRuntime;

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use rtx_cap::{CapabilityPolicy, Manifest};
    use rtx_core::ResourceTable;
    use rtx_dispatch::{Dispatcher, OpContext, OpRegistry};
    use serde_json::{json, Value};
    use std::path::Path;
    use std::sync::Arc;

    fn test_dispatcher() -> Dispatcher {
        let manifest = Manifest::parse(
            "[capabilities.wasm]\nload = true\nexecute = true\n",
            Path::new("manifest.app.toml"),
        )
        .expect("manifest parses");
        let policy = Arc::new(CapabilityPolicy::new(manifest, "/tmp"));
        let resources = Arc::new(ResourceTable::new());
        let ctx = OpContext::new(policy, resources);

        let runtime = Arc::new(WasmRuntime::new().expect("engine starts"));
        let mut registry = OpRegistry::new();
        register(&mut registry, runtime);
        Dispatcher::new(registry, ctx)
    }

    fn compile_args(wat: &str) -> Value {
        let bytes = wat::parse_str(wat).expect("valid wat");
        json!({ "bytes": base64::engine::general_purpose::STANDARD.encode(bytes) })
    }

    #[tokio::test]
    async fn compile_instantiate_call_add_roundtrips() {
        let dispatcher = test_dispatcher();
        let wat = r#"(module
            (func $add (param $a i32) (param $b i32) (result i32)
                local.get $a
                local.get $b
                i32.add)
            (export "add" (func $add)))"#;

        let compiled = dispatcher
            .dispatch("compile", compile_args(wat))
            .await
            .expect("compile succeeds");
        let module_id = compiled["module_id"].clone();

        let instantiated = dispatcher
            .dispatch("instantiate", json!({ "module_id": module_id }))
            .await
            .expect("instantiate succeeds");
        let instance_id = instantiated["instance_id"].clone();

        let result = dispatcher
            .dispatch(
                "call",
                json!({
                    "instance_id": instance_id,
                    "name": "add",
                    "args": [{"type": "i32", "value": 7}, {"type": "i32", "value": 5}],
                }),
            )
            .await
            .expect("call succeeds");
        assert_eq!(result["values"], json!([{"type": "i32", "value": 12}]));

        dispatcher
            .dispatch("drop_instance", json!({ "instance_id": instance_id }))
            .await
            .expect("drop instance");
        dispatcher
            .dispatch("drop_module", json!({ "module_id": module_id }))
            .await
            .expect("drop module");
    }

    #[tokio::test]
    async fn dropping_module_with_live_instance_fails() {
        let dispatcher = test_dispatcher();
        let wat = r#"(module (memory (export "memory") 1))"#;

        let compiled = dispatcher.dispatch("compile", compile_args(wat)).await.expect("compile");
        let module_id = compiled["module_id"].clone();
        dispatcher
            .dispatch("instantiate", json!({ "module_id": module_id }))
            .await
            .expect("instantiate");

        let err = dispatcher
            .dispatch("drop_module", json!({ "module_id": module_id }))
            .await
            .expect_err("module still has a live instance");
        assert_eq!(err.kind, "InvalidModuleHandle");
    }

    #[tokio::test]
    async fn memory_grow_read_write_and_out_of_bounds() {
        let dispatcher = test_dispatcher();
        let wat = r#"(module (memory (export "memory") 1))"#;

        let compiled = dispatcher.dispatch("compile", compile_args(wat)).await.expect("compile");
        let module_id = compiled["module_id"].clone();
        let instantiated = dispatcher
            .dispatch("instantiate", json!({ "module_id": module_id }))
            .await
            .expect("instantiate");
        let instance_id = instantiated["instance_id"].clone();

        let size = dispatcher
            .dispatch("memory_size", json!({ "instance_id": instance_id }))
            .await
            .expect("memory_size");
        assert_eq!(size["pages"], json!(1));

        let grown = dispatcher
            .dispatch("memory_grow", json!({ "instance_id": instance_id, "pages": 2 }))
            .await
            .expect("memory_grow");
        assert_eq!(grown["previous_pages"], json!(1));

        let size = dispatcher
            .dispatch("memory_size", json!({ "instance_id": instance_id }))
            .await
            .expect("memory_size");
        assert_eq!(size["pages"], json!(3));

        let data = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3, 4]);
        dispatcher
            .dispatch(
                "memory_write",
                json!({ "instance_id": instance_id, "offset": 0, "data": data }),
            )
            .await
            .expect("memory_write");

        let read = dispatcher
            .dispatch("memory_read", json!({ "instance_id": instance_id, "offset": 0, "len": 4 }))
            .await
            .expect("memory_read");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(read["data"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4]);

        let out_of_bounds = dispatcher
            .dispatch(
                "memory_read",
                json!({ "instance_id": instance_id, "offset": 64 * 1024 * 3, "len": 1 }),
            )
            .await
            .expect_err("reading past the grown region fails");
        assert_eq!(out_of_bounds.kind, "MemoryError");
    }
}
