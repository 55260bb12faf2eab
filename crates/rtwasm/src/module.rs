// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compiled-module resource. Tracks how many live instances were
//! derived from it so `drop_module` can enforce the "instances outlive
//! their module, never the reverse" invariant (§3 WASM Module).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rtx_core::Resource;
use wasmtime::Module;

pub struct WasmModule {
    pub(crate) module: Module,
    pub(crate) live_instances: Arc<AtomicUsize>,
}

impl WasmModule {
    pub fn new(module: Module) -> Self {
        Self {
            module,
            live_instances: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn has_live_instances(&self) -> bool {
        self.live_instances.load(Ordering::SeqCst) > 0
    }
}

impl Resource for WasmModule {
    fn type_tag(&self) -> &'static str {
        "WasmModule"
    }
}
