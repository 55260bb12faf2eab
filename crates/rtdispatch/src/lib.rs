// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-dispatch: the op dispatcher. Generalizes the daemon's old
//! big-match-on-request-variant shape into a closed name -> handler
//! registry built once at startup, so a new op is a registration call
//! rather than a new match arm. Every dispatched call runs
//! capability-check -> handler -> response envelope, with the capability
//! check performed against a cheap field pulled out of the raw JSON value
//! before the handler deserializes its full typed argument struct (§4.1).

pub mod registry;

pub use registry::{CapArg, CapCheck, OpContext, OpHandler, OpRegistry};

use std::sync::Arc;

use rtx_core::OpError;
use serde_json::Value;
use tracing::{debug, info};

/// Runs registered ops against a shared context. Cheap to clone: it only
/// holds an `Arc` to the registry and context.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<OpRegistry>,
    ctx: Arc<OpContext>,
}

impl Dispatcher {
    pub fn new(registry: OpRegistry, ctx: OpContext) -> Self {
        Self {
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
        }
    }

    /// Dispatch a single guest call. Unknown op names and capability
    /// denials never reach the handler; everything else is the handler's
    /// `Result`, already reduced to the guest-visible envelope shape.
    pub async fn dispatch(&self, op: &str, args: Value) -> Result<Value, OpError> {
        let handler = self
            .registry
            .lookup(op)
            .ok_or_else(|| OpError::dispatch_generic(format!("unknown op: {op}")))?;

        if is_polling_op(op) {
            debug!(op, "dispatching op");
        } else {
            info!(op, "dispatching op");
        }

        if let Some(check) = handler.required_capability(&args) {
            let family = check.kind().error_family();
            self.ctx.check(check).map_err(|denied| {
                OpError::permission_denied(family, denied.to_string()).with_op(op)
            })?;
        }

        handler
            .call(args, Arc::clone(&self.ctx))
            .await
            .map_err(|err| err.with_op(op))
    }
}

/// Ops that are polled frequently by a guest UI loop get a quieter log
/// level than state-changing ops, mirroring the query/mutation split the
/// daemon's listener used to make by request variant.
fn is_polling_op(op: &str) -> bool {
    matches!(
        op,
        "fs_watch_poll" | "process_status" | "receive_pause_event" | "receive_script_event" | "storage_get"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::CapArg;
    use rtx_cap::CapabilityPolicy;
    use rtx_core::{CapabilityKind, ResourceTable};
    use serde_json::json;
    use std::sync::Arc as StdArc;

    struct EchoOp;

    impl OpHandler for EchoOp {
        fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
            None
        }

        fn call(
            &self,
            args: Value,
            _ctx: StdArc<OpContext>,
        ) -> registry::BoxFuture<'static, Result<Value, OpError>> {
            Box::pin(async move { Ok(args) })
        }
    }

    struct GatedOp;

    impl OpHandler for GatedOp {
        fn required_capability(&self, args: &Value) -> Option<CapCheck> {
            let path = args.get("path")?.as_str()?.to_string();
            Some(CapCheck::new(CapabilityKind::FsRead, CapArg::Path(path)))
        }

        fn call(
            &self,
            args: Value,
            _ctx: StdArc<OpContext>,
        ) -> registry::BoxFuture<'static, Result<Value, OpError>> {
            Box::pin(async move { Ok(args) })
        }
    }

    fn test_ctx() -> OpContext {
        let manifest = rtx_cap::Manifest::parse(
            r#"
            [capabilities.fs]
            read = ["./data/**"]
            "#,
            std::path::Path::new("manifest.app.toml"),
        )
        .expect("parses");
        OpContext::new(
            StdArc::new(CapabilityPolicy::new(manifest, "/app")),
            StdArc::new(ResourceTable::new()),
        )
    }

    #[tokio::test]
    async fn unknown_op_is_dispatch_generic() {
        let dispatcher = Dispatcher::new(OpRegistry::new(), test_ctx());
        let err = dispatcher
            .dispatch("nonexistent", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code, rtx_core::codes::WEBVIEW_BASE);
    }

    #[tokio::test]
    async fn known_op_without_capability_runs() {
        let mut registry = OpRegistry::new();
        registry.register("echo", EchoOp);
        let dispatcher = Dispatcher::new(registry, test_ctx());
        let out = dispatcher
            .dispatch("echo", json!({"hello": "world"}))
            .await
            .expect("should succeed");
        assert_eq!(out, json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn gated_op_denies_before_reaching_handler() {
        let mut registry = OpRegistry::new();
        registry.register("read_text", GatedOp);
        let dispatcher = Dispatcher::new(registry, test_ctx());
        let err = dispatcher
            .dispatch("read_text", json!({"path": "./secret.txt"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "PermissionDenied");
        assert_eq!(err.op.as_deref(), Some("read_text"));
    }

    #[tokio::test]
    async fn gated_op_permits_granted_path() {
        let mut registry = OpRegistry::new();
        registry.register("read_text", GatedOp);
        let dispatcher = Dispatcher::new(registry, test_ctx());
        let out = dispatcher
            .dispatch("read_text", json!({"path": "./data/ok.txt"}))
            .await
            .expect("should succeed");
        assert_eq!(out, json!({"path": "./data/ok.txt"}));
    }
}
