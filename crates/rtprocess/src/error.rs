// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

/// Process has no dedicated code range in §7; reuses `ErrorFamily::WebView`
/// as the catch-all (DESIGN.md's Open-question decisions).
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("invalid handle")]
    InvalidHandle,
    #[error("stream not piped")]
    StreamNotPiped,
    #[error("process error: {0}")]
    Generic(String),
}

impl ErrorKind for ProcessError {
    fn code(&self) -> u32 {
        match self {
            ProcessError::PermissionDenied(_) => codes::WEBVIEW_BASE + 1,
            _ => codes::WEBVIEW_BASE,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ProcessError::PermissionDenied(_) => "PermissionDenied",
            ProcessError::InvalidHandle => "InvalidHandle",
            _ => "Generic",
        }
    }
}

impl From<ProcessError> for rtx_core::OpError {
    fn from(err: ProcessError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
