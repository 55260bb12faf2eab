// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DebuggerSession`: the per-application handle to the driver task. One
//! instance lives for the app's lifetime (held directly by the handlers,
//! the same way `rtx-wasm`'s `WasmRuntime` or `rtx-storage`'s `KvStore`
//! is), not as a `ResourceTable` entry — only the event receivers it hands
//! out are resources.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rtx_core::{Broadcaster, Receiver, Resource};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::breakpoint::Breakpoint;
use crate::driver::{Driver, DriverCommand};
use crate::error::DebuggerError;
use crate::events::{PausedEvent, ScriptEvent};

const COMMAND_QUEUE_CAPACITY: usize = 256;

pub struct PauseReceiver(pub Receiver<PausedEvent>);
impl Resource for PauseReceiver {
    fn type_tag(&self) -> &'static str {
        "DebuggerPauseReceiver"
    }
}

pub struct ScriptReceiver(pub Receiver<ScriptEvent>);
impl Resource for ScriptReceiver {
    fn type_tag(&self) -> &'static str {
        "DebuggerScriptReceiver"
    }
}

pub struct DebuggerSession {
    commands: mpsc::Sender<DriverCommand>,
    connected: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    pause_bus: Arc<Broadcaster<PausedEvent>>,
    script_bus: Arc<Broadcaster<ScriptEvent>>,
}

impl DebuggerSession {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));
        let pause_bus = Arc::new(Broadcaster::default());
        let script_bus = Arc::new(Broadcaster::default());
        let driver = Driver::new(rx, connected.clone(), paused.clone(), pause_bus.clone(), script_bus.clone());
        tokio::spawn(driver.run());
        Self { commands: tx, connected, paused, pause_bus, script_bus }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn subscribe_pauses(&self) -> PauseReceiver {
        PauseReceiver(self.pause_bus.subscribe())
    }

    pub fn subscribe_scripts(&self) -> ScriptReceiver {
        ScriptReceiver(self.script_bus.subscribe())
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<Result<T, DebuggerError>>) -> DriverCommand) -> Result<T, DebuggerError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| DebuggerError::ConnectionFailed("driver task is gone".into()))?;
        rx.await.map_err(|_| DebuggerError::ConnectionFailed("driver task dropped the reply".into()))?
    }

    pub async fn connect(&self, url: String) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Connect { url, reply }).await
    }

    pub async fn disconnect(&self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(DriverCommand::Disconnect { reply: tx }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn set_breakpoint(
        &self,
        url: String,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
    ) -> Result<Breakpoint, DebuggerError> {
        self.call(|reply| DriverCommand::SetBreakpoint { url, line, column, condition, reply }).await
    }

    pub async fn remove_breakpoint(&self, local_id: String) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::RemoveBreakpoint { local_id, reply }).await
    }

    pub async fn remove_all_breakpoints(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::RemoveAllBreakpoints { reply }).await
    }

    pub async fn list_breakpoints(&self) -> Result<Vec<Breakpoint>, DebuggerError> {
        self.call(|reply| DriverCommand::ListBreakpoints { reply }).await
    }

    pub async fn enable_breakpoint(&self, local_id: String) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::EnableBreakpoint { local_id, reply }).await
    }

    pub async fn disable_breakpoint(&self, local_id: String) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::DisableBreakpoint { local_id, reply }).await
    }

    pub async fn pause(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Resume { reply }).await
    }

    pub async fn step_over(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Step { method: "Debugger.stepOver", params: serde_json::json!({}), reply }).await
    }

    pub async fn step_into(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Step { method: "Debugger.stepInto", params: serde_json::json!({}), reply }).await
    }

    pub async fn step_out(&self) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Step { method: "Debugger.stepOut", params: serde_json::json!({}), reply }).await
    }

    pub async fn continue_to_location(&self, location: Value) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::Step {
            method: "Debugger.continueToLocation",
            params: serde_json::json!({ "location": location }),
            reply,
        })
        .await
    }

    pub async fn get_call_frames(&self) -> Result<Vec<Value>, DebuggerError> {
        self.call(|reply| DriverCommand::GetCallFrames { reply }).await
    }

    pub async fn get_scope_chain(&self, call_frame_id: String) -> Result<Value, DebuggerError> {
        self.call(|reply| DriverCommand::GetScopeChain { call_frame_id, reply }).await
    }

    pub async fn get_properties(&self, object_id: String, own_only: bool) -> Result<Value, DebuggerError> {
        self.call(|reply| DriverCommand::GetProperties { object_id, own_only, reply }).await
    }

    pub async fn evaluate(&self, expression: String, call_frame_id: Option<String>) -> Result<Value, DebuggerError> {
        self.call(|reply| DriverCommand::Evaluate { expression, call_frame_id, reply }).await
    }

    pub async fn set_variable_value(
        &self,
        scope_number: u32,
        name: String,
        value: Value,
        call_frame_id: String,
    ) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::SetVariableValue { scope_number, name, value, call_frame_id, reply }).await
    }

    pub async fn get_script_source(&self, script_id: String) -> Result<String, DebuggerError> {
        self.call(|reply| DriverCommand::GetScriptSource { script_id, reply }).await
    }

    pub async fn list_scripts(&self) -> Result<Vec<Value>, DebuggerError> {
        self.call(|reply| DriverCommand::ListScripts { reply }).await
    }

    pub async fn set_pause_on_exceptions(&self, state: String) -> Result<(), DebuggerError> {
        self.call(|reply| DriverCommand::SetPauseOnExceptions { state, reply }).await
    }
}
