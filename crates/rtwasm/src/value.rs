// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversion between the guest-visible `{type, value}` grammar and
//! `wasmtime::Val`. Only the four numeric WASM core types are supported —
//! the guest never sees references or vectors.

use serde_json::{json, Value};
use wasmtime::Val;

use crate::error::WasmError;

pub fn val_from_json(entry: &Value) -> Result<Val, WasmError> {
    let ty = entry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| WasmError::TypeError("missing `type` field on argument".into()))?;
    let raw = entry
        .get("value")
        .ok_or_else(|| WasmError::TypeError("missing `value` field on argument".into()))?;

    match ty {
        "i32" => {
            let n = raw
                .as_i64()
                .ok_or_else(|| WasmError::TypeError("i32 value must be an integer".into()))?;
            Ok(Val::I32(n as i32))
        }
        "i64" => {
            let n = raw
                .as_i64()
                .ok_or_else(|| WasmError::TypeError("i64 value must be an integer".into()))?;
            Ok(Val::I64(n))
        }
        "f32" => {
            let n = raw
                .as_f64()
                .ok_or_else(|| WasmError::TypeError("f32 value must be a number".into()))?;
            Ok(Val::F32((n as f32).to_bits()))
        }
        "f64" => {
            let n = raw
                .as_f64()
                .ok_or_else(|| WasmError::TypeError("f64 value must be a number".into()))?;
            Ok(Val::F64(n.to_bits()))
        }
        other => Err(WasmError::TypeError(format!("unsupported value type `{other}`"))),
    }
}

pub fn val_to_json(val: &Val) -> Value {
    match val {
        Val::I32(n) => json!({ "type": "i32", "value": n }),
        Val::I64(n) => json!({ "type": "i64", "value": n }),
        Val::F32(bits) => json!({ "type": "f32", "value": f32::from_bits(*bits) }),
        Val::F64(bits) => json!({ "type": "f64", "value": f64::from_bits(*bits) }),
        _ => json!({ "type": "unsupported", "value": null }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_i32() {
        let entry = json!({ "type": "i32", "value": 7 });
        let val = val_from_json(&entry).expect("parses");
        assert_eq!(val_to_json(&val), json!({ "type": "i32", "value": 7 }));
    }

    #[test]
    fn round_trips_f64() {
        let entry = json!({ "type": "f64", "value": 3.5 });
        let val = val_from_json(&entry).expect("parses");
        assert_eq!(val_to_json(&val), json!({ "type": "f64", "value": 3.5 }));
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let entry = json!({ "type": "v128", "value": 0 });
        assert!(val_from_json(&entry).is_err());
    }

    #[test]
    fn missing_value_field_is_rejected() {
        let entry = json!({ "type": "i32" });
        assert!(val_from_json(&entry).is_err());
    }
}
