// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

/// The network service has no dedicated code range in §7; it reuses
/// `ErrorFamily::WebView`'s generic/permission-denied pair as the catch-all
/// (see DESIGN.md's Open-question decisions).
#[derive(Debug, Error)]
pub enum NetError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("request timed out")]
    Timeout,
}

impl ErrorKind for NetError {
    fn code(&self) -> u32 {
        match self {
            NetError::PermissionDenied(_) => codes::WEBVIEW_BASE + 1,
            NetError::RequestFailed(_) | NetError::Timeout => codes::WEBVIEW_BASE,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            NetError::PermissionDenied(_) => "PermissionDenied",
            NetError::RequestFailed(_) => "Generic",
            NetError::Timeout => "Generic",
        }
    }
}

impl From<NetError> for rtx_core::OpError {
    fn from(err: NetError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
