// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DebuggerError`: every failure mode the driver task or its handlers can
//! surface, mapped onto the `9600..` code range (§7).

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebuggerError {
    #[error("debugger error: {0}")]
    Generic(String),
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("not connected")]
    NotConnected,
    #[error("breakpoint operation failed: {0}")]
    BreakpointFailed(String),
    #[error("unknown call frame id: {0}")]
    InvalidFrameId(String),
    #[error("unknown scope id: {0}")]
    InvalidScopeId(String),
    #[error("evaluation failed: {0}")]
    EvaluationFailed(String),
    #[error("script not found: {0}")]
    SourceNotFound(String),
    #[error("step operation failed: {0}")]
    StepFailed(String),
    #[error("pause failed: {0}")]
    PauseFailed(String),
    #[error("resume failed: {0}")]
    ResumeFailed(String),
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("debugger session is not enabled")]
    NotEnabled,
    #[error("request timed out")]
    Timeout,
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

impl ErrorKind for DebuggerError {
    fn code(&self) -> u32 {
        let offset = match self {
            DebuggerError::Generic(_) => 0,
            DebuggerError::ConnectionFailed(_) => 1,
            DebuggerError::NotConnected => 2,
            DebuggerError::BreakpointFailed(_) => 3,
            DebuggerError::InvalidFrameId(_) => 4,
            DebuggerError::InvalidScopeId(_) => 5,
            DebuggerError::EvaluationFailed(_) => 6,
            DebuggerError::SourceNotFound(_) => 7,
            DebuggerError::StepFailed(_) => 8,
            DebuggerError::PauseFailed(_) => 9,
            DebuggerError::ResumeFailed(_) => 10,
            DebuggerError::ProtocolError(_) => 11,
            DebuggerError::NotEnabled => 12,
            DebuggerError::Timeout => 13,
            DebuggerError::InvalidLocation(_) => 14,
        };
        codes::DEBUGGER_BASE + offset
    }

    fn kind_name(&self) -> &'static str {
        match self {
            DebuggerError::Generic(_) => "Generic",
            DebuggerError::ConnectionFailed(_) => "ConnectionFailed",
            DebuggerError::NotConnected => "NotConnected",
            DebuggerError::BreakpointFailed(_) => "BreakpointFailed",
            DebuggerError::InvalidFrameId(_) => "InvalidFrameId",
            DebuggerError::InvalidScopeId(_) => "InvalidScopeId",
            DebuggerError::EvaluationFailed(_) => "EvaluationFailed",
            DebuggerError::SourceNotFound(_) => "SourceNotFound",
            DebuggerError::StepFailed(_) => "StepFailed",
            DebuggerError::PauseFailed(_) => "PauseFailed",
            DebuggerError::ResumeFailed(_) => "ResumeFailed",
            DebuggerError::ProtocolError(_) => "ProtocolError",
            DebuggerError::NotEnabled => "NotEnabled",
            DebuggerError::Timeout => "Timeout",
            DebuggerError::InvalidLocation(_) => "InvalidLocation",
        }
    }
}

impl From<DebuggerError> for rtx_core::OpError {
    fn from(err: DebuggerError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
