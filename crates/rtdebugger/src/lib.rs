// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! CDP/V8 Inspector client for the guest debugger op family (§6). A single
//! driver task owns the WebSocket exclusively; every other piece of the
//! crate talks to it through `DebuggerSession`'s command channel. None of
//! the ops here are capability-gated — the capability vocabulary (§3) has
//! no debugger entry.

mod breakpoint;
mod driver;
mod error;
mod events;
mod handlers;
mod protocol;
mod session;

pub use breakpoint::{Breakpoint, ExceptionPauseState};
pub use error::DebuggerError;
pub use events::{PausedEvent, ScriptEvent};
pub use handlers::register;
pub use session::{DebuggerSession, PauseReceiver, ScriptReceiver};

#[cfg(test)]
mod tests {
    use super::*;
    use rtx_cap::{CapabilityPolicy, Manifest};
    use rtx_core::ResourceTable;
    use rtx_dispatch::{Dispatcher, OpContext, OpRegistry};
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    fn test_dispatcher(session: Arc<DebuggerSession>) -> Dispatcher {
        let manifest = Manifest::parse("", Path::new("manifest.app.toml")).expect("empty manifest parses");
        let policy = Arc::new(CapabilityPolicy::new(manifest, "/tmp"));
        let resources = Arc::new(ResourceTable::new());
        let ctx = OpContext::new(policy, resources);
        let mut registry = OpRegistry::new();
        register(&mut registry, session);
        Dispatcher::new(registry, ctx)
    }

    #[test]
    fn exception_pause_state_round_trips_through_cdp_strings() {
        assert_eq!(ExceptionPauseState::parse("none"), Some(ExceptionPauseState::None));
        assert_eq!(ExceptionPauseState::parse("uncaught"), Some(ExceptionPauseState::Uncaught));
        assert_eq!(ExceptionPauseState::parse("all"), Some(ExceptionPauseState::All));
        assert_eq!(ExceptionPauseState::parse("bogus"), None);

        assert_eq!(ExceptionPauseState::None.as_cdp_str(), "none");
        assert_eq!(ExceptionPauseState::Uncaught.as_cdp_str(), "uncaught");
        assert_eq!(ExceptionPauseState::All.as_cdp_str(), "all");
    }

    #[tokio::test]
    async fn is_connected_reports_false_before_any_connect_attempt() {
        let session = Arc::new(DebuggerSession::spawn());
        let dispatcher = test_dispatcher(session);
        let result = dispatcher.dispatch("is_connected", json!({})).await.expect("dispatch succeeds");
        assert_eq!(result["connected"], json!(false));
        assert_eq!(result["paused"], json!(false));
    }

    #[tokio::test]
    async fn connect_to_unreachable_url_reports_connection_failed() {
        let session = Arc::new(DebuggerSession::spawn());
        let dispatcher = test_dispatcher(session);
        let result = dispatcher.dispatch("connect", json!({ "url": "ws://127.0.0.1:1/" })).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pause_event_receiver_blocks_until_a_session_closes_it() {
        let session = Arc::new(DebuggerSession::spawn());
        let dispatcher = test_dispatcher(Arc::clone(&session));
        let created = dispatcher.dispatch("create_pause_receiver", json!({})).await.expect("create succeeds");
        assert!(created["rid"].is_u64());
    }

    #[tokio::test]
    async fn disconnect_before_connect_is_a_harmless_no_op() {
        let session = Arc::new(DebuggerSession::spawn());
        let dispatcher = test_dispatcher(session);
        let result = dispatcher.dispatch("disconnect", json!({})).await.expect("disconnect succeeds");
        assert!(result.is_null());
    }
}
