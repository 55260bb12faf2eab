// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires each filesystem op into the dispatcher: capability extraction
//! (glob-gated `fs.read`/`fs.write`) plus argument parsing around the pure
//! bodies in `ops.rs`.

use std::path::PathBuf;
use std::sync::Arc;

use rtx_core::{CapabilityKind, OpError, Rid};
use rtx_dispatch::{registry::BoxFuture, CapArg, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::error::FsError;
use crate::ops;
use crate::watcher::FileWatcher;

fn path_arg(args: &Value, field: &str) -> Result<PathBuf, OpError> {
    ops::parse_path_arg(args, field).map_err(OpError::from)
}

macro_rules! path_read_op {
    ($name:ident, $field:expr, $op:path) => {
        struct $name;
        impl OpHandler for $name {
            fn required_capability(&self, args: &Value) -> Option<CapCheck> {
                let path = args.get($field)?.as_str()?.to_string();
                Some(CapCheck::new(CapabilityKind::FsRead, CapArg::Path(path)))
            }
            fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
                Box::pin(async move {
                    let path = path_arg(&args, $field)?;
                    let result = $op(&path).await.map_err(OpError::from)?;
                    Ok(serde_json::to_value(result).expect("serializable result"))
                })
            }
        }
    };
}

path_read_op!(ReadTextOp, "path", ops::read_text);
path_read_op!(StatOp, "path", ops::stat);
path_read_op!(MetadataOp, "path", ops::metadata);
path_read_op!(ReadDirOp, "path", ops::read_dir);
path_read_op!(ReadLinkOp, "path", ops::read_link);
path_read_op!(RealPathOp, "path", ops::real_path);

struct ReadBytesOp;
impl OpHandler for ReadBytesOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsRead, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let bytes = ops::read_bytes(&path).await.map_err(OpError::from)?;
            Ok(json!({ "data": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes) }))
        })
    }
}

struct ExistsOp;
impl OpHandler for ExistsOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsRead, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            Ok(json!({ "exists": ops::exists(&path).await }))
        })
    }
}

struct WriteTextOp;
impl OpHandler for WriteTextOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let contents = args
                .get("contents")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(FsError::IoError("missing `contents`".into())))?;
            ops::write_text(&path, contents).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct WriteBytesOp;
impl OpHandler for WriteBytesOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let data_b64 = args
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(FsError::IoError("missing `data`".into())))?;
            let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data_b64)
                .map_err(|e| OpError::from(FsError::IoError(e.to_string())))?;
            ops::write_bytes(&path, &bytes).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct AppendTextOp;
impl OpHandler for AppendTextOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let contents = args.get("contents").and_then(Value::as_str).unwrap_or("");
            ops::append_text(&path, contents).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct AppendBytesOp;
impl OpHandler for AppendBytesOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let data_b64 = args
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(FsError::IoError("missing `data`".into())))?;
            let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data_b64)
                .map_err(|e| OpError::from(FsError::IoError(e.to_string())))?;
            ops::append_bytes(&path, &bytes).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct MkdirOp;
impl OpHandler for MkdirOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let recursive = args.get("recursive").and_then(Value::as_bool).unwrap_or(false);
            ops::mkdir(&path, recursive).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct RemoveOp;
impl OpHandler for RemoveOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(path)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let recursive = args.get("recursive").and_then(Value::as_bool).unwrap_or(false);
            ops::remove(&path, recursive).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct RenameOp;
impl OpHandler for RenameOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        // `rename`'s source must be readable and its destination writable;
        // the dispatcher only models a single capability gate per call, so
        // we gate on the write side (the destination) and let the service
        // body fail `NotFound`/`IoError` naturally if the source is
        // unreadable to the OS user, matching the "no rollback" partial
        // failure note in §7.
        let to = args.get("to")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(to)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let from = path_arg(&args, "from")?;
            let to = path_arg(&args, "to")?;
            ops::rename(&from, &to).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct CopyOp;
impl OpHandler for CopyOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let to = args.get("to")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(to)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let from = path_arg(&args, "from")?;
            let to = path_arg(&args, "to")?;
            let bytes = ops::copy(&from, &to).await.map_err(OpError::from)?;
            Ok(json!({ "bytes": bytes }))
        })
    }
}

struct SymlinkOp;
impl OpHandler for SymlinkOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let link = args.get("link")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsWrite, CapArg::Path(link)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let original = path_arg(&args, "original")?;
            let link = path_arg(&args, "link")?;
            ops::symlink(&original, &link).await.map_err(OpError::from)?;
            Ok(Value::Null)
        })
    }
}

struct TempFileOp;
impl OpHandler for TempFileOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let prefix = args.get("prefix").and_then(Value::as_str);
            let suffix = args.get("suffix").and_then(Value::as_str);
            let path = ops::temp_file(prefix, suffix).await.map_err(OpError::from)?;
            Ok(json!({ "path": path }))
        })
    }
}

struct TempDirOp;
impl OpHandler for TempDirOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let prefix = args.get("prefix").and_then(Value::as_str);
            let path = ops::temp_dir(prefix).await.map_err(OpError::from)?;
            Ok(json!({ "path": path }))
        })
    }
}

struct WatchOp;
impl OpHandler for WatchOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let path = args.get("path")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::FsRead, CapArg::Path(path)))
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let path = path_arg(&args, "path")?;
            let recursive = args.get("recursive").and_then(Value::as_bool).unwrap_or(false);
            let watcher = tokio::task::spawn_blocking(move || FileWatcher::create(&path, recursive))
                .await
                .map_err(|e| OpError::from(FsError::WatchError(e.to_string())))?
                .map_err(OpError::from)?;
            let rid = ctx.resources().insert(watcher);
            Ok(json!({ "rid": rid.as_u64() }))
        })
    }
}

struct WatchNextOp;
impl OpHandler for WatchNextOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            let watcher = ctx
                .resources()
                .get::<FileWatcher>(rid)
                .map_err(|_| OpError::invalid_handle("invalid watcher handle"))?;
            match watcher.next().await {
                Some(event) => Ok(serde_json::to_value(event).expect("serializable event")),
                None => Err(OpError::invalid_handle("watcher closed")),
            }
        })
    }
}

struct WatchCloseOp;
impl OpHandler for WatchCloseOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let rid = rid_arg(&args)?;
            ctx.resources()
                .drop(rid)
                .map_err(|_| OpError::invalid_handle("invalid watcher handle"))?;
            Ok(Value::Null)
        })
    }
}

fn rid_arg(args: &Value) -> Result<Rid, OpError> {
    let raw = args
        .get("rid")
        .ok_or_else(|| OpError::invalid_handle("missing `rid` argument"))?;
    serde_json::from_value(raw.clone()).map_err(|_| OpError::invalid_handle("malformed `rid` argument"))
}

/// Register every filesystem op under its §6 op name.
pub fn register(registry: &mut OpRegistry) {
    registry
        .register("read_text", ReadTextOp)
        .register("write_text", WriteTextOp)
        .register("read_bytes", ReadBytesOp)
        .register("write_bytes", WriteBytesOp)
        .register("append_text", AppendTextOp)
        .register("append_bytes", AppendBytesOp)
        .register("stat", StatOp)
        .register("metadata", MetadataOp)
        .register("read_dir", ReadDirOp)
        .register("mkdir", MkdirOp)
        .register("remove", RemoveOp)
        .register("rename", RenameOp)
        .register("copy", CopyOp)
        .register("exists", ExistsOp)
        .register("symlink", SymlinkOp)
        .register("read_link", ReadLinkOp)
        .register("real_path", RealPathOp)
        .register("temp_file", TempFileOp)
        .register("temp_dir", TempDirOp)
        .register("watch", WatchOp)
        .register("watch_next", WatchNextOp)
        .register("watch_close", WatchCloseOp);
}
