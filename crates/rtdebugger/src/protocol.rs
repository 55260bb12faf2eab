// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CDP wire frame: `{id?, method?, params?, result?, error?}`, the same
//! tagged-union shape as the daemon's old length-prefixed JSON envelope in
//! `protocol_wire.rs`, generalized from a fixed request/response enum to
//! bare `serde_json::Value` since the CDP method surface isn't ours to
//! define.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct OutgoingCommand {
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
pub struct CdpErrorObject {
    pub code: i64,
    pub message: String,
}

/// A decoded inbound frame is either a response to a request we sent
/// (`id` present) or an unsolicited event (`method` present). CDP never
/// sends both on the same frame.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<CdpErrorObject>,
}

/// A CDP source location: `{scriptId, lineNumber, columnNumber?}`. The
/// `camelCase` rename matches the wire shape; callers build this from our
/// own `snake_case` op arguments by hand rather than deserializing guest
/// JSON directly into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub script_id: String,
    pub line_number: u32,
    #[serde(default)]
    pub column_number: Option<u32>,
}
