// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The driver task: the single owner of the CDP WebSocket, exactly as the
//! daemon's own engine loop is the single owner of its WAL and sockets
//! (`oj-daemon/src/main.rs`'s `tokio::select!` over command queue, timers,
//! and signals in one task, never shared across tasks). Every debugger op
//! is a message sent in here over `commands`; the loop itself is the only
//! code that ever touches the socket, so there's no locking to get wrong.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use rtx_core::{Broadcaster, Clock, SystemClock};

use crate::breakpoint::{Breakpoint, ExceptionPauseState};
use crate::error::DebuggerError;
use crate::events::{PausedEvent, ScriptEvent};
use crate::protocol::{InboundFrame, OutgoingCommand};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TIMEOUT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Disconnected,
    Connecting,
    Handshake,
    Enabled,
    Paused,
}

/// One in-flight request's continuation: what to do with the CDP response
/// once it arrives, beyond forwarding the bare JSON value.
enum PendingKind {
    Raw(oneshot::Sender<Result<Value, DebuggerError>>),
    SetBreakpointNew {
        local_id: String,
        url: String,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
        reply: oneshot::Sender<Result<Breakpoint, DebuggerError>>,
    },
    ReEnableBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    RemoveBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    DisableBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    PauseResume(oneshot::Sender<Result<(), DebuggerError>>),
    Step(oneshot::Sender<Result<(), DebuggerError>>),
    Evaluate(oneshot::Sender<Result<Value, DebuggerError>>),
    GetProperties(oneshot::Sender<Result<Value, DebuggerError>>),
    GetScriptSource(oneshot::Sender<Result<String, DebuggerError>>),
    SetVariableValue(oneshot::Sender<Result<(), DebuggerError>>),
    SetPauseOnExceptions(oneshot::Sender<Result<(), DebuggerError>>),
}

struct PendingEntry {
    kind: PendingKind,
    issued_at: Instant,
}

/// Every op the public session hands to the driver task.
pub enum DriverCommand {
    Connect {
        url: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    SetBreakpoint {
        url: String,
        line: u32,
        column: Option<u32>,
        condition: Option<String>,
        reply: oneshot::Sender<Result<Breakpoint, DebuggerError>>,
    },
    RemoveBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    RemoveAllBreakpoints {
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    ListBreakpoints {
        reply: oneshot::Sender<Result<Vec<Breakpoint>, DebuggerError>>,
    },
    EnableBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    DisableBreakpoint {
        local_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    Step {
        method: &'static str,
        params: Value,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    GetCallFrames {
        reply: oneshot::Sender<Result<Vec<Value>, DebuggerError>>,
    },
    GetScopeChain {
        call_frame_id: String,
        reply: oneshot::Sender<Result<Value, DebuggerError>>,
    },
    GetProperties {
        object_id: String,
        own_only: bool,
        reply: oneshot::Sender<Result<Value, DebuggerError>>,
    },
    Evaluate {
        expression: String,
        call_frame_id: Option<String>,
        reply: oneshot::Sender<Result<Value, DebuggerError>>,
    },
    SetVariableValue {
        scope_number: u32,
        name: String,
        value: Value,
        call_frame_id: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
    GetScriptSource {
        script_id: String,
        reply: oneshot::Sender<Result<String, DebuggerError>>,
    },
    ListScripts {
        reply: oneshot::Sender<Result<Vec<Value>, DebuggerError>>,
    },
    SetPauseOnExceptions {
        state: String,
        reply: oneshot::Sender<Result<(), DebuggerError>>,
    },
}

pub struct Driver<C: Clock = SystemClock> {
    commands: mpsc::Receiver<DriverCommand>,
    state: ConnectionState,
    ws: Option<WsStream>,
    next_id_counter: u64,
    next_local_id_counter: u64,
    pending: HashMap<u64, PendingEntry>,
    breakpoints: HashMap<String, Breakpoint>,
    local_id_by_cdp: HashMap<String, String>,
    scripts: HashMap<String, Value>,
    last_call_frames: Vec<Value>,
    exception_pause_state: ExceptionPauseState,
    request_timeout: Duration,
    connect_timeout: Duration,
    connected: Arc<AtomicBool>,
    paused_flag: Arc<AtomicBool>,
    pause_bus: Arc<Broadcaster<PausedEvent>>,
    script_bus: Arc<Broadcaster<ScriptEvent>>,
    clock: C,
}

impl Driver<SystemClock> {
    pub fn new(
        commands: mpsc::Receiver<DriverCommand>,
        connected: Arc<AtomicBool>,
        paused_flag: Arc<AtomicBool>,
        pause_bus: Arc<Broadcaster<PausedEvent>>,
        script_bus: Arc<Broadcaster<ScriptEvent>>,
    ) -> Self {
        Self::with_clock(commands, connected, paused_flag, pause_bus, script_bus, SystemClock)
    }
}

impl<C: Clock> Driver<C> {
    /// Same as `new`, but with an injectable clock so the request-timeout
    /// sweep is testable without real sleeps.
    pub fn with_clock(
        commands: mpsc::Receiver<DriverCommand>,
        connected: Arc<AtomicBool>,
        paused_flag: Arc<AtomicBool>,
        pause_bus: Arc<Broadcaster<PausedEvent>>,
        script_bus: Arc<Broadcaster<ScriptEvent>>,
        clock: C,
    ) -> Self {
        Self {
            commands,
            state: ConnectionState::Disconnected,
            ws: None,
            next_id_counter: 1,
            next_local_id_counter: 1,
            pending: HashMap::new(),
            breakpoints: HashMap::new(),
            local_id_by_cdp: HashMap::new(),
            scripts: HashMap::new(),
            last_call_frames: Vec::new(),
            exception_pause_state: ExceptionPauseState::None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            connected,
            paused_flag,
            pause_bus,
            script_bus,
            clock,
        }
    }

    /// The driver task's body. Runs until the owning `DebuggerSession` is
    /// dropped and `commands` closes.
    pub async fn run(mut self) {
        let mut sweep = tokio::time::interval(TIMEOUT_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
                frame = next_ws_frame(&mut self.ws) => {
                    match frame {
                        Some(Ok(msg)) => self.handle_frame(msg),
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "debugger websocket error");
                            self.transition_to_disconnected(format!("websocket error: {e}"));
                        }
                        None => {
                            tracing::debug!("debugger websocket closed by peer");
                            self.transition_to_disconnected("socket closed by peer");
                        }
                    }
                }
                _ = sweep.tick() => self.sweep_timeouts(),
            }
        }
        if let Some(mut ws) = self.ws.take() {
            let _ = ws.close(None).await;
        }
        self.pause_bus.close_all();
        self.script_bus.close_all();
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id_counter;
        self.next_id_counter += 1;
        id
    }

    fn next_local_id(&mut self) -> String {
        let id = self.next_local_id_counter;
        self.next_local_id_counter += 1;
        format!("bp-{id}")
    }

    async fn send_frame(&mut self, id: u64, method: &'static str, params: Value) -> Result<(), DebuggerError> {
        let ws = self.ws.as_mut().ok_or(DebuggerError::NotConnected)?;
        let text = serde_json::to_string(&OutgoingCommand { id, method, params })
            .map_err(|e| DebuggerError::ProtocolError(e.to_string()))?;
        ws.send(Message::Text(text.into()))
            .await
            .map_err(|e| DebuggerError::ConnectionFailed(e.to_string()))
    }

    /// Send one request and block this task until its own response
    /// arrives, routing any events that arrive first through the normal
    /// event path. Only used during the connect handshake, which by
    /// construction happens before any guest call can be in flight.
    async fn call_inline(&mut self, method: &'static str, params: Value) -> Result<Value, DebuggerError> {
        let id = self.next_request_id();
        self.send_frame(id, method, params).await?;
        let deadline = tokio::time::Instant::now() + self.request_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(DebuggerError::Timeout);
            }
            let msg = {
                let ws = self
                    .ws
                    .as_mut()
                    .ok_or_else(|| DebuggerError::ConnectionFailed("socket closed during handshake".into()))?;
                match tokio::time::timeout(remaining, ws.next()).await {
                    Ok(Some(Ok(msg))) => msg,
                    Ok(Some(Err(e))) => return Err(DebuggerError::ConnectionFailed(e.to_string())),
                    Ok(None) => return Err(DebuggerError::ConnectionFailed("socket closed during handshake".into())),
                    Err(_) => return Err(DebuggerError::Timeout),
                }
            };
            let text = match msg {
                Message::Text(t) => t.to_string(),
                Message::Close(_) => return Err(DebuggerError::ConnectionFailed("socket closed during handshake".into())),
                _ => continue,
            };
            let Ok(frame) = serde_json::from_str::<InboundFrame>(&text) else {
                continue;
            };
            match frame.id {
                Some(got_id) if got_id == id => {
                    return match frame.error {
                        Some(e) => Err(DebuggerError::ProtocolError(format!("{} ({})", e.message, e.code))),
                        None => Ok(frame.result.unwrap_or(Value::Null)),
                    };
                }
                Some(_) => continue,
                None => {
                    if let Some(method) = frame.method {
                        self.handle_event(&method, frame.params.unwrap_or(Value::Null));
                    }
                }
            }
        }
    }

    async fn connect(&mut self, url: &str) -> Result<(), DebuggerError> {
        self.state = ConnectionState::Connecting;
        let (stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| DebuggerError::Timeout)?
            .map_err(|e| DebuggerError::ConnectionFailed(e.to_string()))?;
        self.ws = Some(stream);
        self.state = ConnectionState::Handshake;
        self.call_inline("Debugger.enable", json!({})).await?;
        self.call_inline("Runtime.enable", json!({})).await?;
        if self.exception_pause_state != ExceptionPauseState::None {
            let _ = self
                .call_inline(
                    "Debugger.setPauseOnExceptions",
                    json!({ "state": self.exception_pause_state.as_cdp_str() }),
                )
                .await;
        }
        self.state = ConnectionState::Enabled;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn handle_command(&mut self, cmd: DriverCommand) {
        match cmd {
            DriverCommand::Connect { url, reply } => {
                if matches!(self.state, ConnectionState::Enabled | ConnectionState::Paused) {
                    let _ = reply.send(Ok(()));
                    return;
                }
                let outcome = self.connect(&url).await;
                if let Err(e) = &outcome {
                    self.transition_to_disconnected(e.to_string());
                }
                let _ = reply.send(outcome);
            }
            DriverCommand::Disconnect { reply } => {
                if let Some(mut ws) = self.ws.take() {
                    let _ = ws.close(None).await;
                }
                self.transition_to_disconnected("disconnected by caller");
                let _ = reply.send(());
            }
            DriverCommand::SetBreakpoint {
                url,
                line,
                column,
                condition,
                reply,
            } => {
                let local_id = self.next_local_id();
                let mut params = json!({ "lineNumber": line, "url": url });
                if let Some(col) = column {
                    params["columnNumber"] = json!(col);
                }
                if let Some(cond) = &condition {
                    params["condition"] = json!(cond);
                }
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.setBreakpointByUrl", params).await {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry {
                                kind: PendingKind::SetBreakpointNew {
                                    local_id,
                                    url,
                                    line,
                                    column,
                                    condition,
                                    reply,
                                },
                                issued_at: self.clock.now(),
                            },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::RemoveBreakpoint { local_id, reply } => {
                let Some(cdp_id) = self.breakpoints.get(&local_id).and_then(|bp| bp.cdp_id.clone()) else {
                    self.breakpoints.remove(&local_id);
                    let _ = reply.send(Err(DebuggerError::BreakpointFailed(format!("unknown breakpoint {local_id}"))));
                    return;
                };
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.removeBreakpoint", json!({ "breakpointId": cdp_id })).await {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry {
                                kind: PendingKind::RemoveBreakpoint { local_id, reply },
                                issued_at: self.clock.now(),
                            },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::RemoveAllBreakpoints { reply } => {
                let cdp_ids: Vec<String> = self.breakpoints.values().filter_map(|bp| bp.cdp_id.clone()).collect();
                for cdp_id in cdp_ids {
                    // Local bookkeeping below is authoritative; CDP is told
                    // best-effort without waiting on each reply.
                    let id = self.next_request_id();
                    let _ = self.send_frame(id, "Debugger.removeBreakpoint", json!({ "breakpointId": cdp_id })).await;
                }
                self.breakpoints.clear();
                self.local_id_by_cdp.clear();
                let _ = reply.send(Ok(()));
            }
            DriverCommand::ListBreakpoints { reply } => {
                let mut list: Vec<Breakpoint> = self.breakpoints.values().cloned().collect();
                list.sort_by(|a, b| a.local_id.cmp(&b.local_id));
                let _ = reply.send(Ok(list));
            }
            DriverCommand::EnableBreakpoint { local_id, reply } => {
                let Some(bp) = self.breakpoints.get(&local_id) else {
                    let _ = reply.send(Err(DebuggerError::BreakpointFailed(format!("unknown breakpoint {local_id}"))));
                    return;
                };
                if bp.enabled {
                    let _ = reply.send(Ok(()));
                    return;
                }
                let mut params = json!({ "lineNumber": bp.line, "url": bp.url });
                if let Some(col) = bp.column {
                    params["columnNumber"] = json!(col);
                }
                if let Some(cond) = &bp.condition {
                    params["condition"] = json!(cond);
                }
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.setBreakpointByUrl", params).await {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry {
                                kind: PendingKind::ReEnableBreakpoint { local_id, reply },
                                issued_at: self.clock.now(),
                            },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::DisableBreakpoint { local_id, reply } => {
                let Some(cdp_id) = self.breakpoints.get(&local_id).and_then(|bp| bp.cdp_id.clone()) else {
                    let _ = reply.send(Err(DebuggerError::BreakpointFailed(format!(
                        "unknown or already-disabled breakpoint {local_id}"
                    ))));
                    return;
                };
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.removeBreakpoint", json!({ "breakpointId": cdp_id })).await {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry {
                                kind: PendingKind::DisableBreakpoint { local_id, reply },
                                issued_at: self.clock.now(),
                            },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::Pause { reply } => {
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.pause", json!({})).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::PauseResume(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::Resume { reply } => {
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.resume", json!({})).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::PauseResume(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::Step { method, params, reply } => {
                if self.state != ConnectionState::Paused {
                    let _ = reply.send(Err(DebuggerError::StepFailed("not paused".into())));
                    return;
                }
                let id = self.next_request_id();
                match self.send_frame(id, method, params).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::Step(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::GetCallFrames { reply } => {
                let _ = reply.send(Ok(self.last_call_frames.clone()));
            }
            DriverCommand::GetScopeChain { call_frame_id, reply } => {
                let frame = self
                    .last_call_frames
                    .iter()
                    .find(|f| f.get("callFrameId").and_then(Value::as_str) == Some(call_frame_id.as_str()));
                match frame {
                    Some(f) => {
                        let _ = reply.send(Ok(f.get("scopeChain").cloned().unwrap_or(Value::Array(Vec::new()))));
                    }
                    None => {
                        let _ = reply.send(Err(DebuggerError::InvalidFrameId(call_frame_id)));
                    }
                }
            }
            DriverCommand::GetProperties { object_id, own_only, reply } => {
                let id = self.next_request_id();
                let params = json!({ "objectId": object_id, "ownProperties": own_only });
                match self.send_frame(id, "Runtime.getProperties", params).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::GetProperties(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::Evaluate { expression, call_frame_id, reply } => {
                if call_frame_id.is_some() && self.state != ConnectionState::Paused {
                    let _ = reply.send(Err(DebuggerError::EvaluationFailed("not paused".into())));
                    return;
                }
                let (method, params): (&'static str, Value) = match call_frame_id {
                    Some(frame_id) => (
                        "Debugger.evaluateOnCallFrame",
                        json!({ "callFrameId": frame_id, "expression": expression }),
                    ),
                    None => ("Runtime.evaluate", json!({ "expression": expression })),
                };
                let id = self.next_request_id();
                match self.send_frame(id, method, params).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::Evaluate(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::SetVariableValue { scope_number, name, value, call_frame_id, reply } => {
                let id = self.next_request_id();
                let params = json!({
                    "scopeNumber": scope_number,
                    "variableName": name,
                    "newValue": value,
                    "callFrameId": call_frame_id,
                });
                match self.send_frame(id, "Debugger.setVariableValue", params).await {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry { kind: PendingKind::SetVariableValue(reply), issued_at: self.clock.now() },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::GetScriptSource { script_id, reply } => {
                let id = self.next_request_id();
                match self.send_frame(id, "Debugger.getScriptSource", json!({ "scriptId": script_id })).await {
                    Ok(()) => {
                        self.pending
                            .insert(id, PendingEntry { kind: PendingKind::GetScriptSource(reply), issued_at: self.clock.now() });
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DriverCommand::ListScripts { reply } => {
                let _ = reply.send(Ok(self.scripts.values().cloned().collect()));
            }
            DriverCommand::SetPauseOnExceptions { state, reply } => {
                let Some(parsed) = ExceptionPauseState::parse(&state) else {
                    let _ = reply.send(Err(DebuggerError::Generic(format!("invalid exception pause state {state}"))));
                    return;
                };
                self.exception_pause_state = parsed;
                let id = self.next_request_id();
                match self
                    .send_frame(id, "Debugger.setPauseOnExceptions", json!({ "state": parsed.as_cdp_str() }))
                    .await
                {
                    Ok(()) => {
                        self.pending.insert(
                            id,
                            PendingEntry { kind: PendingKind::SetPauseOnExceptions(reply), issued_at: self.clock.now() },
                        );
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
        }
    }

    fn handle_frame(&mut self, msg: Message) {
        let text = match msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => {
                self.transition_to_disconnected("peer sent close frame");
                return;
            }
            _ => return,
        };
        let frame: InboundFrame = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "malformed CDP frame");
                return;
            }
        };
        if let Some(id) = frame.id {
            self.handle_response(id, frame.result, frame.error);
        } else if let Some(method) = frame.method {
            self.handle_event(&method, frame.params.unwrap_or(Value::Null));
        }
    }

    fn handle_response(&mut self, id: u64, result: Option<Value>, error: Option<crate::protocol::CdpErrorObject>) {
        let Some(entry) = self.pending.remove(&id) else {
            return;
        };
        let outcome = match error {
            Some(e) => Err(DebuggerError::ProtocolError(format!("{} ({})", e.message, e.code))),
            None => Ok(result.unwrap_or(Value::Null)),
        };
        self.resolve_pending(entry.kind, outcome);
    }

    fn handle_event(&mut self, method: &str, params: Value) {
        match method {
            "Debugger.paused" => {
                let reason = params.get("reason").and_then(Value::as_str).unwrap_or("other").to_string();
                let call_frames = params.get("callFrames").and_then(Value::as_array).cloned().unwrap_or_default();
                let hit_cdp_ids: Vec<String> = params
                    .get("hitBreakpoints")
                    .and_then(Value::as_array)
                    .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
                let mut hit_local_ids = Vec::new();
                for cdp_id in &hit_cdp_ids {
                    if let Some(local_id) = self.local_id_by_cdp.get(cdp_id).cloned() {
                        if let Some(bp) = self.breakpoints.get_mut(&local_id) {
                            bp.hit_count += 1;
                        }
                        hit_local_ids.push(local_id);
                    }
                }
                self.last_call_frames = call_frames.clone();
                self.state = ConnectionState::Paused;
                self.paused_flag.store(true, Ordering::SeqCst);
                self.pause_bus.publish(PausedEvent::Paused {
                    reason,
                    call_frames,
                    hit_breakpoints: hit_local_ids,
                    data: params.get("data").cloned(),
                });
            }
            "Debugger.resumed" => {
                self.last_call_frames.clear();
                if self.state == ConnectionState::Paused {
                    self.state = ConnectionState::Enabled;
                }
                self.paused_flag.store(false, Ordering::SeqCst);
                self.pause_bus.publish(PausedEvent::Resumed);
            }
            "Debugger.scriptParsed" => {
                if let Some(script_id) = params.get("scriptId").and_then(Value::as_str) {
                    let url = params.get("url").and_then(Value::as_str).unwrap_or_default().to_string();
                    self.scripts.insert(script_id.to_string(), params.clone());
                    self.script_bus.publish(ScriptEvent { script_id: script_id.to_string(), url, raw: params });
                }
            }
            "Debugger.breakpointResolved" => {
                if let Some(cdp_id) = params.get("breakpointId").and_then(Value::as_str) {
                    if let Some(local_id) = self.local_id_by_cdp.get(cdp_id).cloned() {
                        if let Some(bp) = self.breakpoints.get_mut(&local_id) {
                            bp.resolved_location =
                                params.get("location").cloned().and_then(|loc| serde_json::from_value(loc).ok());
                        }
                    }
                }
            }
            other => tracing::debug!(method = other, "unhandled CDP event"),
        }
    }

    fn resolve_pending(&mut self, kind: PendingKind, result: Result<Value, DebuggerError>) {
        match kind {
            PendingKind::Raw(tx) => {
                let _ = tx.send(result);
            }
            PendingKind::SetBreakpointNew { local_id, url, line, column, condition, reply } => {
                let outcome: Result<Breakpoint, DebuggerError> = result.and_then(|value| {
                    let cdp_id = value
                        .get("breakpointId")
                        .and_then(Value::as_str)
                        .ok_or_else(|| DebuggerError::ProtocolError("setBreakpointByUrl missing breakpointId".into()))?
                        .to_string();
                    let resolved_location = value
                        .get("locations")
                        .and_then(Value::as_array)
                        .and_then(|locs| locs.first())
                        .and_then(|loc| serde_json::from_value(loc.clone()).ok());
                    Ok(Breakpoint {
                        local_id: local_id.clone(),
                        cdp_id: Some(cdp_id),
                        url,
                        line,
                        column,
                        condition,
                        enabled: true,
                        hit_count: 0,
                        resolved_location,
                    })
                });
                if let Ok(bp) = &outcome {
                    if let Some(cdp_id) = &bp.cdp_id {
                        self.local_id_by_cdp.insert(cdp_id.clone(), local_id.clone());
                    }
                    self.breakpoints.insert(local_id.clone(), bp.clone());
                }
                let _ = reply.send(outcome.map_err(|e| DebuggerError::BreakpointFailed(e.to_string())));
            }
            PendingKind::ReEnableBreakpoint { local_id, reply } => {
                let outcome = result.and_then(|value| {
                    value
                        .get("breakpointId")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| DebuggerError::ProtocolError("setBreakpointByUrl missing breakpointId".into()))
                });
                match outcome {
                    Ok(cdp_id) => {
                        if let Some(bp) = self.breakpoints.get_mut(&local_id) {
                            bp.enabled = true;
                            bp.cdp_id = Some(cdp_id.clone());
                        }
                        self.local_id_by_cdp.insert(cdp_id, local_id);
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(DebuggerError::BreakpointFailed(e.to_string())));
                    }
                }
            }
            PendingKind::RemoveBreakpoint { local_id, reply } => match result {
                Ok(_) => {
                    if let Some(bp) = self.breakpoints.remove(&local_id) {
                        if let Some(cdp_id) = bp.cdp_id {
                            self.local_id_by_cdp.remove(&cdp_id);
                        }
                    }
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(DebuggerError::BreakpointFailed(e.to_string())));
                }
            },
            PendingKind::DisableBreakpoint { local_id, reply } => match result {
                Ok(_) => {
                    if let Some(bp) = self.breakpoints.get_mut(&local_id) {
                        if let Some(cdp_id) = bp.cdp_id.take() {
                            self.local_id_by_cdp.remove(&cdp_id);
                        }
                        bp.enabled = false;
                    }
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(DebuggerError::BreakpointFailed(e.to_string())));
                }
            },
            PendingKind::PauseResume(tx) => {
                let _ = tx.send(result.map(|_| ()));
            }
            PendingKind::Step(tx) => {
                let _ = tx.send(result.map(|_| ()).map_err(|e| DebuggerError::StepFailed(e.to_string())));
            }
            PendingKind::Evaluate(tx) => {
                let outcome = result.and_then(|value| {
                    if let Some(details) = value.get("exceptionDetails") {
                        return Err(DebuggerError::EvaluationFailed(details.to_string()));
                    }
                    Ok(value.get("result").cloned().unwrap_or(Value::Null))
                });
                let _ = tx.send(outcome);
            }
            PendingKind::GetProperties(tx) => {
                let _ = tx.send(result);
            }
            PendingKind::GetScriptSource(tx) => {
                let outcome = result.and_then(|value| {
                    value
                        .get("scriptSource")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| DebuggerError::SourceNotFound("scriptSource missing from response".into()))
                });
                let _ = tx.send(outcome);
            }
            PendingKind::SetVariableValue(tx) => {
                let _ = tx.send(result.map(|_| ()));
            }
            PendingKind::SetPauseOnExceptions(tx) => {
                let _ = tx.send(result.map(|_| ()));
            }
        }
    }

    fn fail_all_pending(&mut self, err: DebuggerError) {
        let entries: Vec<PendingEntry> = self.pending.drain().map(|(_, entry)| entry).collect();
        for entry in entries {
            self.resolve_pending(entry.kind, Err(err.clone()));
        }
    }

    fn sweep_timeouts(&mut self) {
        let now = self.clock.now();
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.issued_at) > self.request_timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(entry) = self.pending.remove(&id) {
                self.resolve_pending(entry.kind, Err(DebuggerError::Timeout));
            }
        }
    }

    /// Transport dropped from underneath the session: any request still
    /// in flight fails with `ConnectionFailed`, not `NotConnected` — the
    /// latter is reserved for a new command issued while already
    /// disconnected (§7 propagation policy).
    fn transition_to_disconnected(&mut self, reason: impl Into<String>) {
        self.ws = None;
        self.state = ConnectionState::Disconnected;
        self.connected.store(false, Ordering::SeqCst);
        self.paused_flag.store(false, Ordering::SeqCst);
        self.fail_all_pending(DebuggerError::ConnectionFailed(reason.into()));
    }
}

async fn next_ws_frame(ws: &mut Option<WsStream>) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match ws {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtx_core::FakeClock;

    fn test_driver(clock: FakeClock) -> Driver<FakeClock> {
        let (_tx, rx) = mpsc::channel(1);
        Driver::with_clock(
            rx,
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicBool::new(false)),
            Arc::new(Broadcaster::default()),
            Arc::new(Broadcaster::default()),
            clock,
        )
    }

    #[tokio::test]
    async fn sweep_timeouts_expires_only_once_the_fake_clock_passes_the_deadline() {
        let clock = FakeClock::new();
        let mut driver = test_driver(clock.clone());

        let (tx, mut rx) = oneshot::channel();
        let issued_at = driver.clock.now();
        driver.pending.insert(1, PendingEntry { kind: PendingKind::PauseResume(tx), issued_at });

        driver.sweep_timeouts();
        assert!(driver.pending.contains_key(&1), "request is not yet expired");
        assert!(matches!(rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)));

        clock.advance(DEFAULT_REQUEST_TIMEOUT + Duration::from_secs(1));
        driver.sweep_timeouts();
        assert!(!driver.pending.contains_key(&1));
        assert_eq!(rx.await.expect("reply sent"), Err(DebuggerError::Timeout));
    }
}
