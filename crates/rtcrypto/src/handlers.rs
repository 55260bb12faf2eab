// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use rtx_core::OpError;
use rtx_dispatch::{registry::BoxFuture, CapCheck, OpContext, OpHandler, OpRegistry};
use serde_json::{json, Value};

use crate::error::CryptoError;
use crate::ops;

fn b64_decode(s: &str) -> Result<Vec<u8>, OpError> {
    base64::Engine::decode(&base64::engine::general_purpose::STANDARD, s)
        .map_err(|e| OpError::from(CryptoError::InvalidArgument(e.to_string())))
}

fn b64_encode(bytes: impl AsRef<[u8]>) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

struct RandomBytesOp;
impl OpHandler for RandomBytesOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let n = args.get("n").and_then(Value::as_u64).unwrap_or(32) as usize;
            Ok(json!({ "data": b64_encode(ops::random_bytes(n)) }))
        })
    }
}

struct RandomUuidOp;
impl OpHandler for RandomUuidOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, _args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move { Ok(json!({ "uuid": ops::random_uuid() })) })
    }
}

struct HashOp;
impl OpHandler for HashOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let algo = args
                .get("algo")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(CryptoError::InvalidArgument("missing `algo`".into())))?;
            let bytes = args
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| OpError::from(CryptoError::InvalidArgument("missing `data`".into())))?;
            let bytes = b64_decode(bytes)?;
            let digest = ops::hash(algo, &bytes).map_err(OpError::from)?;
            Ok(json!({ "hex": digest }))
        })
    }
}

struct EncryptOp;
impl OpHandler for EncryptOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let algo = algo_arg(&args)?;
            let key = b64_decode(field_str(&args, "key")?)?;
            let data = b64_decode(field_str(&args, "data")?)?;
            let result = ops::encrypt(&algo, &key, &data).map_err(OpError::from)?;
            Ok(json!({
                "ciphertext": b64_encode(result.ciphertext),
                "iv": b64_encode(result.iv),
                "tag": b64_encode(result.tag),
            }))
        })
    }
}

struct DecryptOp;
impl OpHandler for DecryptOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let algo = algo_arg(&args)?;
            let key = b64_decode(field_str(&args, "key")?)?;
            let ciphertext = b64_decode(field_str(&args, "ciphertext")?)?;
            let iv = b64_decode(field_str(&args, "iv")?)?;
            let tag = b64_decode(field_str(&args, "tag")?)?;
            let plaintext =
                ops::decrypt(&algo, &key, &ciphertext, &iv, &tag).map_err(OpError::from)?;
            Ok(json!({ "data": b64_encode(plaintext) }))
        })
    }
}

struct DeriveKeyOp;
impl OpHandler for DeriveKeyOp {
    fn required_capability(&self, _args: &Value) -> Option<CapCheck> {
        None
    }
    fn call(&self, args: Value, _ctx: Arc<OpContext>) -> BoxFuture<'static, Result<Value, OpError>> {
        Box::pin(async move {
            let password = field_str(&args, "password")?.as_bytes().to_vec();
            let salt = b64_decode(field_str(&args, "salt")?)?;
            let iterations = args
                .get("iterations")
                .and_then(Value::as_u64)
                .unwrap_or(100_000) as u32;
            let length = args.get("length").and_then(Value::as_u64).unwrap_or(32) as usize;
            let key = ops::derive_key(&password, &salt, iterations, length);
            Ok(json!({ "key": b64_encode(key) }))
        })
    }
}

fn algo_arg(args: &Value) -> Result<String, OpError> {
    Ok(field_str(args, "algo")?.to_string())
}

fn field_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, OpError> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| OpError::from(CryptoError::InvalidArgument(format!("missing `{field}`"))))
}

pub fn register(registry: &mut OpRegistry) {
    registry
        .register("random_bytes", RandomBytesOp)
        .register("random_uuid", RandomUuidOp)
        .register("hash", HashOp)
        .register("encrypt", EncryptOp)
        .register("decrypt", DecryptOp)
        .register("derive_key", DeriveKeyOp);
}
