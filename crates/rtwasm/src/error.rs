// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rtx_core::{codes, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WasmError {
    #[error("module failed to compile: {0}")]
    CompileError(String),
    #[error("instantiation failed: {0}")]
    InstantiateError(String),
    #[error("call failed: {0}")]
    CallError(String),
    #[error("export not found: {0}")]
    ExportNotFound(String),
    #[error("invalid module handle")]
    InvalidModuleHandle,
    #[error("invalid instance handle")]
    InvalidInstanceHandle,
    #[error("memory access out of bounds: {0}")]
    MemoryError(String),
    #[error("argument type mismatch: {0}")]
    TypeError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("WASI error: {0}")]
    WasiError(String),
    #[error("fuel exhausted")]
    FuelExhausted,
}

impl ErrorKind for WasmError {
    fn code(&self) -> u32 {
        let offset = match self {
            WasmError::CompileError(_) => 0,
            WasmError::InstantiateError(_) => 1,
            WasmError::CallError(_) => 2,
            WasmError::ExportNotFound(_) => 3,
            WasmError::InvalidModuleHandle => 4,
            WasmError::InvalidInstanceHandle => 5,
            WasmError::MemoryError(_) => 6,
            WasmError::TypeError(_) => 7,
            WasmError::IoError(_) => 8,
            WasmError::PermissionDenied(_) => 9,
            WasmError::WasiError(_) => 10,
            WasmError::FuelExhausted => 11,
        };
        codes::WASM_BASE + offset
    }

    fn kind_name(&self) -> &'static str {
        match self {
            WasmError::CompileError(_) => "CompileError",
            WasmError::InstantiateError(_) => "InstantiateError",
            WasmError::CallError(_) => "CallError",
            WasmError::ExportNotFound(_) => "ExportNotFound",
            WasmError::InvalidModuleHandle => "InvalidModuleHandle",
            WasmError::InvalidInstanceHandle => "InvalidInstanceHandle",
            WasmError::MemoryError(_) => "MemoryError",
            WasmError::TypeError(_) => "TypeError",
            WasmError::IoError(_) => "IoError",
            WasmError::PermissionDenied(_) => "PermissionDenied",
            WasmError::WasiError(_) => "WasiError",
            WasmError::FuelExhausted => "FuelExhausted",
        }
    }
}

impl From<std::io::Error> for WasmError {
    fn from(err: std::io::Error) -> Self {
        WasmError::IoError(err.to_string())
    }
}

impl From<WasmError> for rtx_core::OpError {
    fn from(err: WasmError) -> Self {
        rtx_core::OpError::from_kind(&err)
    }
}
