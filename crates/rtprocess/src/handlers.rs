// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use rtx_core::{CapabilityKind, OpError, Rid};
use rtx_dispatch::{registry::BoxFuture, CapArg, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::child::{ChildProcess, SpawnOptions};
use crate::error::ProcessError;

fn rid_arg(args: &Value) -> Result<Rid, OpError> {
    let raw = args
        .get("rid")
        .ok_or_else(|| OpError::invalid_handle("missing `rid` argument"))?;
    serde_json::from_value(raw.clone()).map_err(|_| OpError::invalid_handle("malformed `rid` argument"))
}

fn get_child(ctx: &OpContext, rid: Rid) -> Result<Arc<ChildProcess>, OpError> {
    ctx.resources()
        .get::<ChildProcess>(rid)
        .map_err(|_| OpError::invalid_handle("invalid process handle"))
}

struct SpawnOp;
impl OpHandler for SpawnOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let bin = args.get("bin")?.as_str()?.to_string();
        Some(CapCheck::new(
            CapabilityKind::ProcessSpawn,
            CapArg::Flag(Some(bin)),
        ))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let bin = args
                .get("bin")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(ProcessError::SpawnFailed("missing `bin`".into())))?
                .to_string();
            let opts: SpawnOptions = args
                .get("options")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            let child = ChildProcess::spawn(&bin, &opts).map_err(OpError::from)?;
            let pid = child.pid;
            let rid = ctx.resources().insert(child);
            Ok(json!({ "rid": rid, "pid": pid }))
        })
    }
}

struct KillOp;
impl OpHandler for KillOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            child.kill().await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct WaitOp;
impl OpHandler for WaitOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            let code = child.wait().await.map_err(OpError::from)?;
            Ok(json!({ "exit_code": code }))
        })
    }
}

struct StatusOp;
impl OpHandler for StatusOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            let status = child.status().await.map_err(OpError::from)?;
            Ok(json!({ "exit_code": status, "running": status.is_none() }))
        })
    }
}

struct WriteStdinOp;
impl OpHandler for WriteStdinOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            let data_b64 = args
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(ProcessError::Generic("missing `data`".into())))?;
            let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data_b64)
                .map_err(|e| OpError::from(ProcessError::Generic(e.to_string())))?;
            child.write_stdin(&bytes).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct ReadStdoutOp;
impl OpHandler for ReadStdoutOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            let max_bytes = args.get("max_bytes").and_then(Value::as_u64).unwrap_or(4096) as usize;
            let (data, eof) = child.read_stdout(max_bytes).await.map_err(OpError::from)?;
            Ok(json!({
                "data": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data),
                "eof": eof,
            }))
        })
    }
}

struct ReadStderrOp;
impl OpHandler for ReadStderrOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let child = get_child(&ctx, rid)?;
            let max_bytes = args.get("max_bytes").and_then(Value::as_u64).unwrap_or(4096) as usize;
            let (data, eof) = child.read_stderr(max_bytes).await.map_err(OpError::from)?;
            Ok(json!({
                "data": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data),
                "eof": eof,
            }))
        })
    }
}

pub fn register(registry: &mut OpRegistry) {
    registry
        .register("spawn", SpawnOp)
        .register("kill", KillOp)
        .register("wait", WaitOp)
        .register("status", StatusOp)
        .register("write_stdin", WriteStdinOp)
        .register("read_stdout", ReadStdoutOp)
        .register("read_stderr", ReadStderrOp);
}
