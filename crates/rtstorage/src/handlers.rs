// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use rtx_core::OpError;
use rtx_dispatch::{registry::BoxFuture, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::error::StorageError;
use crate::store::KvStore;

fn key_arg(args: &Value) -> Result<String, OpError> {
    args.get("key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OpError::from(StorageError::InvalidArgument("missing `key`".into())))
}

struct GetOp {
    store: Arc<KvStore>,
}
impl OpHandler for GetOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let key = key_arg(&args)?;
            match store.get(&key) {
                Some(bytes) => Ok(json!({
                    "value": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
                })),
                None => Ok(json!({ "value": null })),
            }
        })
    }
}

struct SetOp {
    store: Arc<KvStore>,
}
impl OpHandler for SetOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let key = key_arg(&args)?;
            let value_b64 = args
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(StorageError::InvalidArgument("missing `value`".into())))?;
            let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, value_b64)
                .map_err(|e| OpError::from(StorageError::InvalidArgument(e.to_string())))?;
            store.set(&key, bytes).map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct RemoveOp {
    store: Arc<KvStore>,
}
impl OpHandler for RemoveOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            let key = key_arg(&args)?;
            let removed = store.remove(&key).map_err(OpError::from)?;
            Ok(json!({ "removed": removed }))
        })
    }
}

/// Register the storage op family bound to one application's `KvStore`.
pub fn register(registry: &mut OpRegistry, store: Arc<KvStore>) {
    registry
        .register("get", GetOp { store: Arc::clone(&store) })
        .register("set", SetOp { store: Arc::clone(&store) })
        .register("remove", RemoveOp { store });
}
