// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Op handlers for the debugger op family (§6). None of these are
//! capability-gated — the capability vocabulary (§3) has no debugger
//! entry, mirroring `rtx-crypto`/`rtx-storage` — so every handler here is
//! the same shape: pull typed arguments out of the raw JSON, call into the
//! shared `DebuggerSession`, shape the result. That uniformity is captured
//! as data (a function pointer per op name) rather than one boilerplate
//! `OpHandler` impl per op, the same "registry as data, not as code" idea
//! `rtx-dispatch` itself is built on.

use std::sync::Arc;

use rtx_core::{OpError, Rid};
use rtx_dispatch::registry::BoxFuture;
use rtx_dispatch::{CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::error::DebuggerError;
use crate::session::{DebuggerSession, PauseReceiver, ScriptReceiver};

fn str_arg(args: &Value, field: &str) -> Result<String, OpError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OpError::from(DebuggerError::Generic(format!("missing `{field}`"))))
}

fn opt_str_arg(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(Value::as_str).map(str::to_string)
}

fn u32_arg(args: &Value, field: &str) -> Result<u32, OpError> {
    args.get(field)
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .ok_or_else(|| OpError::from(DebuggerError::Generic(format!("missing or invalid `{field}`"))))
}

fn opt_u32_arg(args: &Value, field: &str) -> Option<u32> {
    args.get(field).and_then(Value::as_u64).map(|v| v as u32)
}

fn bool_arg(args: &Value, field: &str, default: bool) -> bool {
    args.get(field).and_then(Value::as_bool).unwrap_or(default)
}

fn rid_arg(args: &Value, field: &str) -> Result<Rid, OpError> {
    args.get(field)
        .cloned()
        .ok_or_else(|| OpError::from(DebuggerError::Generic(format!("missing `{field}`"))))
        .and_then(|raw| {
            serde_json::from_value(raw).map_err(|e| OpError::from(DebuggerError::Generic(format!("invalid `{field}`: {e}"))))
        })
}

type OpFn = fn(Arc<DebuggerSession>, Value, Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>>;

struct DebuggerOp {
    session: Arc<DebuggerSession>,
    run: OpFn,
}

impl OpHandler for DebuggerOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }

    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        (self.run)(Arc::clone(&self.session), args, ctx)
    }
}

fn op_connect(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let url = str_arg(&args, "url")?;
        session.connect(url).await.map_err(OpError::from)?;
        Ok(json!({ "connected": true }))
    })
}

fn op_disconnect(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.disconnect().await;
        Ok(Value::Null)
    })
}

fn op_is_connected(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move { Ok(json!({ "connected": session.is_connected(), "paused": session.is_paused() })) })
}

fn op_set_breakpoint(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let url = str_arg(&args, "url")?;
        let line = u32_arg(&args, "line")?;
        let column = opt_u32_arg(&args, "column");
        let condition = opt_str_arg(&args, "condition");
        let bp = session.set_breakpoint(url, line, column, condition).await.map_err(OpError::from)?;
        serde_json::to_value(bp).map_err(|e| OpError::from(DebuggerError::ProtocolError(e.to_string())))
    })
}

fn op_remove_breakpoint(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let local_id = str_arg(&args, "breakpoint_id")?;
        session.remove_breakpoint(local_id).await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_remove_all_breakpoints(
    session: Arc<DebuggerSession>,
    _args: Value,
    _ctx: Arc<OpContext>,
) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.remove_all_breakpoints().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_list_breakpoints(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let breakpoints = session.list_breakpoints().await.map_err(OpError::from)?;
        Ok(json!({ "breakpoints": breakpoints }))
    })
}

fn op_enable_breakpoint(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let local_id = str_arg(&args, "breakpoint_id")?;
        session.enable_breakpoint(local_id).await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_disable_breakpoint(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let local_id = str_arg(&args, "breakpoint_id")?;
        session.disable_breakpoint(local_id).await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_pause(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.pause().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_resume(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.resume().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_step_over(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.step_over().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_step_into(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.step_into().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_step_out(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        session.step_out().await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_continue_to_location(
    session: Arc<DebuggerSession>,
    args: Value,
    _ctx: Arc<OpContext>,
) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let script_id = args
            .pointer("/location/script_id")
            .and_then(Value::as_str)
            .ok_or_else(|| OpError::from(DebuggerError::InvalidLocation("missing location.script_id".into())))?
            .to_string();
        let line_number = args
            .pointer("/location/line_number")
            .and_then(Value::as_u64)
            .ok_or_else(|| OpError::from(DebuggerError::InvalidLocation("missing location.line_number".into())))?;
        let column_number = args.pointer("/location/column_number").and_then(Value::as_u64);
        let mut location = json!({ "scriptId": script_id, "lineNumber": line_number });
        if let Some(col) = column_number {
            location["columnNumber"] = json!(col);
        }
        session.continue_to_location(location).await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_get_call_frames(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let call_frames = session.get_call_frames().await.map_err(OpError::from)?;
        Ok(json!({ "call_frames": call_frames }))
    })
}

fn op_get_scope_chain(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let call_frame_id = str_arg(&args, "call_frame_id")?;
        let scope_chain = session.get_scope_chain(call_frame_id).await.map_err(OpError::from)?;
        Ok(json!({ "scope_chain": scope_chain }))
    })
}

fn op_get_properties(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let object_id = str_arg(&args, "object_id")?;
        let own_only = bool_arg(&args, "own_only", false);
        let result = session.get_properties(object_id, own_only).await.map_err(OpError::from)?;
        Ok(json!({ "result": result }))
    })
}

fn op_evaluate(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let expression = str_arg(&args, "expression")?;
        let call_frame_id = opt_str_arg(&args, "call_frame_id");
        let result = session.evaluate(expression, call_frame_id).await.map_err(OpError::from)?;
        Ok(json!({ "result": result }))
    })
}

fn op_set_variable_value(
    session: Arc<DebuggerSession>,
    args: Value,
    _ctx: Arc<OpContext>,
) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let scope_number = u32_arg(&args, "scope_number")?;
        let name = str_arg(&args, "name")?;
        let value = args
            .get("value")
            .cloned()
            .ok_or_else(|| OpError::from(DebuggerError::Generic("missing `value`".into())))?;
        let call_frame_id = str_arg(&args, "call_frame_id")?;
        session
            .set_variable_value(scope_number, name, value, call_frame_id)
            .await
            .map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_get_script_source(session: Arc<DebuggerSession>, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let script_id = str_arg(&args, "script_id")?;
        let source = session.get_script_source(script_id).await.map_err(OpError::from)?;
        Ok(json!({ "script_source": source }))
    })
}

fn op_list_scripts(session: Arc<DebuggerSession>, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let scripts = session.list_scripts().await.map_err(OpError::from)?;
        Ok(json!({ "scripts": scripts }))
    })
}

fn op_set_pause_on_exceptions(
    session: Arc<DebuggerSession>,
    args: Value,
    _ctx: Arc<OpContext>,
) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let state = str_arg(&args, "state")?;
        session.set_pause_on_exceptions(state).await.map_err(OpError::from)?;
        Ok(Value::Null)
    })
}

fn op_create_pause_receiver(session: Arc<DebuggerSession>, _args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let rid = ctx.resources().insert(session.subscribe_pauses());
        Ok(json!({ "rid": rid.as_u64() }))
    })
}

fn op_receive_pause_event(session: Arc<DebuggerSession>, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    let _ = &session;
    Box::pin(async move {
        let rid = rid_arg(&args, "rid")?;
        let receiver = ctx
            .resources()
            .get::<PauseReceiver>(rid)
            .map_err(|_| OpError::invalid_handle("invalid pause receiver handle"))?;
        match receiver.0.recv().await {
            Some(event) => serde_json::to_value(event).map_err(|e| OpError::from(DebuggerError::ProtocolError(e.to_string()))),
            None => Err(OpError::from(DebuggerError::NotConnected)),
        }
    })
}

fn op_create_script_receiver(session: Arc<DebuggerSession>, _args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    Box::pin(async move {
        let rid = ctx.resources().insert(session.subscribe_scripts());
        Ok(json!({ "rid": rid.as_u64() }))
    })
}

fn op_receive_script_event(session: Arc<DebuggerSession>, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
    let _ = &session;
    Box::pin(async move {
        let rid = rid_arg(&args, "rid")?;
        let receiver = ctx
            .resources()
            .get::<ScriptReceiver>(rid)
            .map_err(|_| OpError::invalid_handle("invalid script receiver handle"))?;
        match receiver.0.recv().await {
            Some(event) => serde_json::to_value(event).map_err(|e| OpError::from(DebuggerError::ProtocolError(e.to_string()))),
            None => Err(OpError::from(DebuggerError::NotConnected)),
        }
    })
}

pub fn register(registry: &mut OpRegistry, session: Arc<DebuggerSession>) {
    registry
        .register("connect", DebuggerOp { session: session.clone(), run: op_connect })
        .register("disconnect", DebuggerOp { session: session.clone(), run: op_disconnect })
        .register("is_connected", DebuggerOp { session: session.clone(), run: op_is_connected })
        .register("set_breakpoint", DebuggerOp { session: session.clone(), run: op_set_breakpoint })
        .register("remove_breakpoint", DebuggerOp { session: session.clone(), run: op_remove_breakpoint })
        .register("remove_all_breakpoints", DebuggerOp { session: session.clone(), run: op_remove_all_breakpoints })
        .register("list_breakpoints", DebuggerOp { session: session.clone(), run: op_list_breakpoints })
        .register("enable_breakpoint", DebuggerOp { session: session.clone(), run: op_enable_breakpoint })
        .register("disable_breakpoint", DebuggerOp { session: session.clone(), run: op_disable_breakpoint })
        .register("pause", DebuggerOp { session: session.clone(), run: op_pause })
        .register("resume", DebuggerOp { session: session.clone(), run: op_resume })
        .register("step_over", DebuggerOp { session: session.clone(), run: op_step_over })
        .register("step_into", DebuggerOp { session: session.clone(), run: op_step_into })
        .register("step_out", DebuggerOp { session: session.clone(), run: op_step_out })
        .register("continue_to_location", DebuggerOp { session: session.clone(), run: op_continue_to_location })
        .register("get_call_frames", DebuggerOp { session: session.clone(), run: op_get_call_frames })
        .register("get_scope_chain", DebuggerOp { session: session.clone(), run: op_get_scope_chain })
        .register("get_properties", DebuggerOp { session: session.clone(), run: op_get_properties })
        .register("evaluate", DebuggerOp { session: session.clone(), run: op_evaluate })
        .register("set_variable_value", DebuggerOp { session: session.clone(), run: op_set_variable_value })
        .register("get_script_source", DebuggerOp { session: session.clone(), run: op_get_script_source })
        .register("list_scripts", DebuggerOp { session: session.clone(), run: op_list_scripts })
        .register("set_pause_on_exceptions", DebuggerOp { session: session.clone(), run: op_set_pause_on_exceptions })
        .register("create_pause_receiver", DebuggerOp { session: session.clone(), run: op_create_pause_receiver })
        .register("receive_pause_event", DebuggerOp { session: session.clone(), run: op_receive_pause_event })
        .register("create_script_receiver", DebuggerOp { session: session.clone(), run: op_create_script_receiver })
        .register("receive_script_event", DebuggerOp { session, run: op_receive_script_event });
}
