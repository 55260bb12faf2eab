// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A handful of dispatcher-level ops that aren't owned by any one service:
//! a liveness check, a version/uptime query, a diagnostics query over any
//! receiver-backed resource's overflow counter, and the explicit
//! `shutdown` op the host loop can wake up on instead of only a process
//! signal (§2).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rtx_core::OpError;
use rtx_debugger::{PauseReceiver, ScriptReceiver};
use rtx_dispatch::registry::BoxFuture;
use rtx_dispatch::{CapCheck, OpContext, OpHandler, OpRegistry};
use rtx_fs::FileWatcher;
use serde_json::{json, Value};
use tokio::sync::Notify;

struct PingOp;

impl OpHandler for PingOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }

    fn call(&self, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move { Ok(json!({ "pong": true })) })
    }
}

struct StatusOp {
    start_time: Instant,
}

impl OpHandler for StatusOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }

    fn call(&self, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let uptime_secs = self.start_time.elapsed().as_secs();
        Box::pin(async move {
            Ok(json!({
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_secs": uptime_secs,
            }))
        })
    }
}

struct ShutdownOp {
    notify: Arc<Notify>,
    requested: Arc<AtomicBool>,
}

impl OpHandler for ShutdownOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }

    fn call(&self, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_one();
        Box::pin(async move { Ok(Value::Null) })
    }
}

struct DiagnosticsOp;

impl OpHandler for DiagnosticsOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }

    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid: rtx_core::Rid = args
                .get("rid")
                .cloned()
                .ok_or_else(|| OpError::invalid_handle("missing `rid` argument"))
                .and_then(|raw| serde_json::from_value(raw).map_err(|_| OpError::invalid_handle("malformed `rid` argument")))?;

            if let Ok(watcher) = ctx.resources().get::<FileWatcher>(rid) {
                return Ok(json!({ "overflow_count": watcher.overflow_count() }));
            }
            if let Ok(receiver) = ctx.resources().get::<PauseReceiver>(rid) {
                return Ok(json!({ "overflow_count": receiver.0.overflow_count() }));
            }
            if let Ok(receiver) = ctx.resources().get::<ScriptReceiver>(rid) {
                return Ok(json!({ "overflow_count": receiver.0.overflow_count() }));
            }
            Err(OpError::invalid_handle("rid does not refer to a receiver-backed resource"))
        })
    }
}

pub fn register(registry: &mut OpRegistry, start_time: Instant, shutdown: Arc<Notify>, shutdown_requested: Arc<AtomicBool>) {
    registry
        .register("ping", PingOp)
        .register("status", StatusOp { start_time })
        .register("diagnostics", DiagnosticsOp)
        .register("shutdown", ShutdownOp { notify: shutdown, requested: shutdown_requested });
}
