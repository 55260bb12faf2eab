// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide WASM runtime state: one `wasmtime::Engine` shared by every
//! compiled module, configured for fuel-limited execution so a guest module
//! cannot hang a worker thread forever.

use wasmtime::{Config, Engine, Linker, Module};

use crate::error::WasmError;
use crate::instance::HostState;

/// Default fuel budget for a single `call` invocation, overridable via
/// `RTX_WASM_FUEL` for hosts that need to run heavier modules.
pub const DEFAULT_FUEL: u64 = 10_000_000;

#[derive(Clone)]
pub struct WasmRuntime {
    engine: Engine,
}

impl WasmRuntime {
    pub fn new() -> Result<Self, WasmError> {
        let mut config = Config::new();
        config.consume_fuel(true);
        let engine = Engine::new(&config).map_err(|e| WasmError::InstantiateError(e.to_string()))?;
        Ok(Self { engine })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn compile(&self, bytes: &[u8]) -> Result<Module, WasmError> {
        Module::new(&self.engine, bytes).map_err(|e| WasmError::CompileError(e.to_string()))
    }

    /// A linker with the WASI preview1 host functions registered. Harmless
    /// for modules that never import `wasi_snapshot_preview1` — wasmtime
    /// only resolves the imports a module actually declares.
    pub fn linker(&self) -> Result<Linker<HostState>, WasmError> {
        let mut linker = Linker::new(&self.engine);
        wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |state: &mut HostState| &mut state.wasi)
            .map_err(|e| WasmError::WasiError(e.to_string()))?;
        Ok(linker)
    }

    pub fn fuel_budget() -> u64 {
        std::env::var("RTX_WASM_FUEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_FUEL)
    }
}
