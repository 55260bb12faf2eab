// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two event families fanned out via `rtx_core::Broadcaster`:
//! `Debugger.paused` (with its own derived "resumed" transition folded in
//! as `PausedEvent::Resumed`) and `Debugger.scriptParsed`.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum PausedEvent {
    Paused {
        reason: String,
        call_frames: Vec<Value>,
        hit_breakpoints: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Resumed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptEvent {
    pub script_id: String,
    pub url: String,
    pub raw: Value,
}
