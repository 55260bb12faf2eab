// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint bookkeeping. The guest only ever sees a `local_id`; the
//! `cdp_id` CDP hands back from `Debugger.setBreakpointByUrl` is an
//! internal indirection so hit counts survive a disable/enable cycle even
//! though CDP itself forgets the breakpoint entirely when it's removed.

use serde::Serialize;

use crate::protocol::Location;

#[derive(Debug, Clone, Serialize)]
pub struct Breakpoint {
    pub local_id: String,
    /// `None` while disabled — CDP has no record of it during that window.
    #[serde(skip)]
    pub cdp_id: Option<String>,
    pub url: String,
    pub line: u32,
    pub column: Option<u32>,
    pub condition: Option<String>,
    pub enabled: bool,
    pub hit_count: u64,
    pub resolved_location: Option<Location>,
}

/// `Debugger.setPauseOnExceptions`'s `state` argument, persisted across
/// reconnects so a fresh connection reapplies whatever policy was last
/// set rather than silently reverting to CDP's own default of `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionPauseState {
    #[default]
    None,
    Uncaught,
    All,
}

impl ExceptionPauseState {
    pub fn parse(state: &str) -> Option<Self> {
        match state {
            "none" => Some(Self::None),
            "uncaught" => Some(Self::Uncaught),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_cdp_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Uncaught => "uncaught",
            Self::All => "all",
        }
    }
}
