// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

/// Crypto has no dedicated code range in §7; reuses `ErrorFamily::WebView`
/// as the catch-all (DESIGN.md's Open-question decisions).
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ErrorKind for CryptoError {
    fn code(&self) -> u32 {
        codes::WEBVIEW_BASE
    }

    fn kind_name(&self) -> &'static str {
        "Generic"
    }
}

impl From<CryptoError> for rtx_core::OpError {
    fn from(err: CryptoError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
