// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use reqwest::Client;
use rtx_core::{CapabilityKind, OpError};
use rtx_dispatch::{registry::BoxFuture, CapArg, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::error::NetError;
use crate::ops::{self, FetchOptions};

fn url_arg(args: &Value) -> Result<String, OpError> {
    args.get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| OpError::from(NetError::RequestFailed("missing `url`".into())))
}

fn opts_arg(args: &Value) -> FetchOptions {
    args.get("options")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

struct FetchOp {
    client: Client,
}
impl OpHandler for FetchOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let url = args.get("url")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::NetFetch, CapArg::Url(url)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = url_arg(&args)?;
            let opts = opts_arg(&args);
            let resp = ops::fetch(&client, &url, opts).await.map_err(OpError::from)?;
            Ok(serde_json::to_value(resp).expect("serializable"))
        })
    }
}

struct FetchBytesOp {
    client: Client,
}
impl OpHandler for FetchBytesOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let url = args.get("url")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::NetFetch, CapArg::Url(url)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = url_arg(&args)?;
            let opts = opts_arg(&args);
            let resp = ops::fetch_bytes(&client, &url, opts).await.map_err(OpError::from)?;
            Ok(serde_json::to_value(resp).expect("serializable"))
        })
    }
}

struct FetchJsonOp {
    client: Client,
}
impl OpHandler for FetchJsonOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let url = args.get("url")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::NetFetch, CapArg::Url(url)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = url_arg(&args)?;
            let opts = opts_arg(&args);
            ops::fetch_json(&client, &url, opts).await.map_err(OpError::from)
        })
    }
}

struct PostJsonOp {
    client: Client,
}
impl OpHandler for PostJsonOp {
    fn required_capability(&self, args: &Value) -> Option<CapCheck> {
        let url = args.get("url")?.as_str()?.to_string();
        Some(CapCheck::new(CapabilityKind::NetFetch, CapArg::Url(url)))
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let url = url_arg(&args)?;
            let payload = args.get("payload").cloned().unwrap_or(json!({}));
            ops::post_json(&client, &url, payload).await.map_err(OpError::from)
        })
    }
}

/// Register every network op under its §6 op name. Takes an owned
/// `reqwest::Client` so the caller controls connection pooling/TLS config
/// (one client per `rthost` process, per reqwest's own pooling guidance).
pub fn register(registry: &mut OpRegistry, client: Client) {
    registry
        .register("fetch", FetchOp { client: client.clone() })
        .register("fetch_bytes", FetchBytesOp { client: client.clone() })
        .register("fetch_json", FetchJsonOp { client: client.clone() })
        .register("post_json", PostJsonOp { client });
}
