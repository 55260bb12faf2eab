// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

/// Storage has no dedicated code range in §7; reuses `ErrorFamily::WebView`
/// as the catch-all (DESIGN.md's Open-question decisions).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("corrupt store: {0}")]
    Corrupt(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ErrorKind for StorageError {
    fn code(&self) -> u32 {
        codes::WEBVIEW_BASE
    }

    fn kind_name(&self) -> &'static str {
        "Generic"
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<StorageError> for rtx_core::OpError {
    fn from(err: StorageError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
