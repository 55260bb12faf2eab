// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

/// Filesystem error taxonomy, codes 3000-3009 (§7).
#[derive(Debug, Error)]
pub enum FsError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("is a directory: {0}")]
    IsDirectory(String),
    #[error("not a directory: {0}")]
    NotDirectory(String),
    #[error("watch error: {0}")]
    WatchError(String),
    #[error("symlink error: {0}")]
    SymlinkError(String),
    #[error("temp file error: {0}")]
    TempError(String),
    #[error("invalid handle")]
    InvalidHandle,
}

impl ErrorKind for FsError {
    fn code(&self) -> u32 {
        let base = codes::FILESYSTEM_BASE;
        base + match self {
            FsError::IoError(_) => 0,
            FsError::PermissionDenied(_) => 1,
            FsError::NotFound(_) => 2,
            FsError::AlreadyExists(_) => 3,
            FsError::IsDirectory(_) => 4,
            FsError::NotDirectory(_) => 5,
            FsError::WatchError(_) => 6,
            FsError::SymlinkError(_) => 7,
            FsError::TempError(_) => 8,
            FsError::InvalidHandle => 9,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            FsError::IoError(_) => "IoError",
            FsError::PermissionDenied(_) => "PermissionDenied",
            FsError::NotFound(_) => "NotFound",
            FsError::AlreadyExists(_) => "AlreadyExists",
            FsError::IsDirectory(_) => "IsDirectory",
            FsError::NotDirectory(_) => "NotDirectory",
            FsError::WatchError(_) => "WatchError",
            FsError::SymlinkError(_) => "SymlinkError",
            FsError::TempError(_) => "TempError",
            FsError::InvalidHandle => "InvalidHandle",
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as IoKind;
        match err.kind() {
            IoKind::NotFound => FsError::NotFound(err.to_string()),
            IoKind::AlreadyExists => FsError::AlreadyExists(err.to_string()),
            IoKind::PermissionDenied => FsError::PermissionDenied(err.to_string()),
            _ => FsError::IoError(err.to_string()),
        }
    }
}

impl From<FsError> for rtx_core::OpError {
    fn from(err: FsError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
