// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Everything that can go wrong bringing a runtime host up or down. Not an
//! `ErrorKind` impl — these never reach a guest, they abort the process
//! before the op dispatcher exists.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to acquire lock at {0}: {1}")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] rtx_cap::ManifestError),

    #[error("no state directory could be determined (set RTX_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("wasm engine failed to start: {0}")]
    WasmInit(String),

    #[error("HTTP client failed to build: {0}")]
    NetInit(#[from] reqwest::Error),

    #[error("storage failed to open: {0}")]
    StorageInit(#[from] rtx_storage::StorageError),
}
