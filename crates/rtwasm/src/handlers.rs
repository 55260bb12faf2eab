// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use base64::Engine as _;
use rtx_core::{CapabilityKind, OpError, Rid};
use rtx_dispatch::registry::BoxFuture;
use rtx_dispatch::{CapArg, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};
use wasmtime::{Extern, Store};

use crate::error::WasmError;
use crate::instance::{HostState, WasmInstance};
use crate::module::WasmModule;
use crate::runtime::WasmRuntime;
use crate::value::{val_from_json, val_to_json};
use crate::wasi_ctx::{build_wasi_ctx, WasiConfigArg};

fn rid_arg(args: &Value, field: &str) -> Result<Rid, OpError> {
    args.get(field)
        .cloned()
        .ok_or_else(|| OpError::from(WasmError::TypeError(format!("missing `{field}`"))))
        .and_then(|raw| {
            serde_json::from_value(raw)
                .map_err(|e| OpError::from(WasmError::TypeError(format!("invalid `{field}`: {e}"))))
        })
}

fn module_rid(args: &Value) -> Result<Rid, OpError> {
    rid_arg(args, "module_id")
}

fn instance_rid(args: &Value) -> Result<Rid, OpError> {
    rid_arg(args, "instance_id")
}

struct CompileOp {
    runtime: Arc<WasmRuntime>,
}
impl OpHandler for CompileOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmLoad, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let runtime = Arc::clone(&self.runtime);
        Box::pin(async move {
            let b64 = args
                .get("bytes")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `bytes`".into())))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| OpError::from(WasmError::CompileError(e.to_string())))?;
            let module = runtime.compile(&bytes).map_err(OpError::from)?;
            let rid = ctx.resources().insert(WasmModule::new(module));
            Ok(json!({ "module_id": rid.as_u64() }))
        })
    }
}

struct CompileFileOp {
    runtime: Arc<WasmRuntime>,
}
impl OpHandler for CompileFileOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmLoad, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let runtime = Arc::clone(&self.runtime);
        Box::pin(async move {
            let path = args
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `path`".into())))?
                .to_string();
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| OpError::from(WasmError::from(e)))?;
            let module = runtime.compile(&bytes).map_err(OpError::from)?;
            let rid = ctx.resources().insert(WasmModule::new(module));
            Ok(json!({ "module_id": rid.as_u64() }))
        })
    }
}

struct DropModuleOp;
impl OpHandler for DropModuleOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = module_rid(&args)?;
            let module = ctx
                .resources()
                .get::<WasmModule>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidModuleHandle))?;
            if module.has_live_instances() {
                return Err(OpError::from(WasmError::InvalidModuleHandle));
            }
            drop(module);
            ctx.resources()
                .drop(rid)
                .map_err(|_| OpError::from(WasmError::InvalidModuleHandle))?;
            Ok(Value::Null)
        })
    }
}

struct InstantiateOp {
    runtime: Arc<WasmRuntime>,
}
impl OpHandler for InstantiateOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmExecute, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let runtime = Arc::clone(&self.runtime);
        Box::pin(async move {
            let module_id = module_rid(&args)?;
            let wasm_module = ctx
                .resources()
                .get::<WasmModule>(module_id)
                .map_err(|_| OpError::from(WasmError::InvalidModuleHandle))?;

            let wasi_cfg: Option<WasiConfigArg> = match args.get("wasi_cfg") {
                Some(raw) if !raw.is_null() => Some(
                    serde_json::from_value(raw.clone())
                        .map_err(|e| OpError::from(WasmError::TypeError(e.to_string())))?,
                ),
                _ => None,
            };
            let wasi = build_wasi_ctx(wasi_cfg, ctx.policy()).map_err(OpError::from)?;

            let module = wasm_module.module.clone();
            let live_instances = wasm_module.live_instances.clone();
            let linker = runtime.linker().map_err(OpError::from)?;

            let mut store = Store::new(runtime.engine(), HostState { wasi });
            store
                .set_fuel(WasmRuntime::fuel_budget())
                .map_err(|e| OpError::from(WasmError::InstantiateError(e.to_string())))?;
            let instance = linker
                .instantiate(&mut store, &module)
                .map_err(|e| OpError::from(WasmError::InstantiateError(e.to_string())))?;

            let instance_rid = ctx
                .resources()
                .insert(WasmInstance::new(store, instance, live_instances));
            Ok(json!({ "instance_id": instance_rid.as_u64() }))
        })
    }
}

struct CallOp;
impl OpHandler for CallOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmExecute, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = instance_rid(&args)?;
            let name = args
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `name`".into())))?
                .to_string();
            let arg_values = args
                .get("args")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;

            let params = arg_values
                .iter()
                .map(val_from_json)
                .collect::<Result<Vec<_>, _>>()
                .map_err(OpError::from)?;

            tokio::task::spawn_blocking(move || {
                let mut store = wasm_instance.store.lock().map_err(|_| {
                    OpError::from(WasmError::CallError("instance store mutex poisoned".into()))
                })?;
                let func = wasm_instance
                    .instance
                    .get_func(&mut *store, &name)
                    .ok_or_else(|| OpError::from(WasmError::ExportNotFound(name.clone())))?;
                let ty = func.ty(&mut *store);
                let mut results = vec![wasmtime::Val::I32(0); ty.results().len()];
                func.call(&mut *store, &params, &mut results)
                    .map_err(|e| classify_call_error(&e))?;
                Ok(json!({ "values": results.iter().map(val_to_json).collect::<Vec<_>>() }))
            })
            .await
            .map_err(|e| OpError::from(WasmError::CallError(e.to_string())))?
        })
    }
}

fn classify_call_error(err: &anyhow::Error) -> OpError {
    if let Some(trap) = err.downcast_ref::<wasmtime::Trap>() {
        if *trap == wasmtime::Trap::OutOfFuel {
            return OpError::from(WasmError::FuelExhausted);
        }
    }
    OpError::from(WasmError::CallError(err.to_string()))
}

struct GetExportsOp;
impl OpHandler for GetExportsOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = instance_rid(&args)?;
            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            let mut store = wasm_instance
                .store
                .lock()
                .map_err(|_| OpError::from(WasmError::CallError("instance store mutex poisoned".into())))?;
            let exports: Vec<Value> = wasm_instance
                .instance
                .exports(&mut *store)
                .map(|export| {
                    let name = export.name().to_string();
                    let kind = match export.into_extern() {
                        Extern::Func(_) => "func",
                        Extern::Memory(_) => "memory",
                        Extern::Global(_) => "global",
                        Extern::Table(_) => "table",
                        _ => "other",
                    };
                    json!({ "name": name, "kind": kind })
                })
                .collect();
            Ok(json!({ "exports": exports }))
        })
    }
}

fn memory_rw_args(args: &Value) -> Result<(Rid, usize), OpError> {
    let rid = instance_rid(args)?;
    let offset = args
        .get("offset")
        .and_then(Value::as_u64)
        .ok_or_else(|| OpError::from(WasmError::TypeError("missing `offset`".into())))? as usize;
    Ok((rid, offset))
}

struct MemoryReadOp;
impl OpHandler for MemoryReadOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let (rid, offset) = memory_rw_args(&args)?;
            let len = args
                .get("len")
                .and_then(Value::as_u64)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `len`".into())))? as usize;
            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            let mut store = wasm_instance
                .store
                .lock()
                .map_err(|_| OpError::from(WasmError::CallError("instance store mutex poisoned".into())))?;
            let memory = wasm_instance
                .instance
                .get_memory(&mut *store, "memory")
                .ok_or_else(|| OpError::from(WasmError::ExportNotFound("memory".into())))?;
            let mut buf = vec![0u8; len];
            memory
                .read(&mut *store, offset, &mut buf)
                .map_err(|e| OpError::from(WasmError::MemoryError(e.to_string())))?;
            Ok(json!({ "data": base64::engine::general_purpose::STANDARD.encode(buf) }))
        })
    }
}

struct MemoryWriteOp;
impl OpHandler for MemoryWriteOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmExecute, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let (rid, offset) = memory_rw_args(&args)?;
            let data_b64 = args
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `data`".into())))?;
            let data = base64::engine::general_purpose::STANDARD
                .decode(data_b64)
                .map_err(|e| OpError::from(WasmError::TypeError(e.to_string())))?;
            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            let mut store = wasm_instance
                .store
                .lock()
                .map_err(|_| OpError::from(WasmError::CallError("instance store mutex poisoned".into())))?;
            let memory = wasm_instance
                .instance
                .get_memory(&mut *store, "memory")
                .ok_or_else(|| OpError::from(WasmError::ExportNotFound("memory".into())))?;
            memory
                .write(&mut *store, offset, &data)
                .map_err(|e| OpError::from(WasmError::MemoryError(e.to_string())))?;
            Ok(Value::Null)
        })
    }
}

struct MemorySizeOp;
impl OpHandler for MemorySizeOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = instance_rid(&args)?;
            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            let mut store = wasm_instance
                .store
                .lock()
                .map_err(|_| OpError::from(WasmError::CallError("instance store mutex poisoned".into())))?;
            let memory = wasm_instance
                .instance
                .get_memory(&mut *store, "memory")
                .ok_or_else(|| OpError::from(WasmError::ExportNotFound("memory".into())))?;
            Ok(json!({ "pages": memory.size(&mut *store) }))
        })
    }
}

struct MemoryGrowOp;
impl OpHandler for MemoryGrowOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        Some(CapCheck::new(CapabilityKind::WasmExecute, CapArg::Flag(None)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = instance_rid(&args)?;
            let delta = args
                .get("pages")
                .and_then(Value::as_u64)
                .ok_or_else(|| OpError::from(WasmError::TypeError("missing `pages`".into())))?;
            let wasm_instance = ctx
                .resources()
                .get::<WasmInstance>(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            let mut store = wasm_instance
                .store
                .lock()
                .map_err(|_| OpError::from(WasmError::CallError("instance store mutex poisoned".into())))?;
            let memory = wasm_instance
                .instance
                .get_memory(&mut *store, "memory")
                .ok_or_else(|| OpError::from(WasmError::ExportNotFound("memory".into())))?;
            let previous = memory
                .grow(&mut *store, delta)
                .map_err(|e| OpError::from(WasmError::MemoryError(e.to_string())))?;
            Ok(json!({ "previous_pages": previous }))
        })
    }
}

struct DropInstanceOp;
impl OpHandler for DropInstanceOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = instance_rid(&args)?;
            ctx.resources()
                .drop(rid)
                .map_err(|_| OpError::from(WasmError::InvalidInstanceHandle))?;
            Ok(Value::Null)
        })
    }
}

pub fn register(registry: &mut OpRegistry, runtime: Arc<WasmRuntime>) {
    registry
        .register("compile", CompileOp { runtime: Arc::clone(&runtime) })
        .register("compile_file", CompileFileOp { runtime: Arc::clone(&runtime) })
        .register("drop_module", DropModuleOp)
        .register("instantiate", InstantiateOp { runtime })
        .register("call", CallOp)
        .register("get_exports", GetExportsOp)
        .register("memory_read", MemoryReadOp)
        .register("memory_write", MemoryWriteOp)
        .register("memory_size", MemorySizeOp)
        .register("memory_grow", MemoryGrowOp)
        .register("drop_instance", DropInstanceOp);
}
