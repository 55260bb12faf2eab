// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The instantiated-module resource. Owns the `wasmtime::Store` exclusively
//! (guarded by a `std::sync::Mutex` since every call into an instance
//! mutates store state) and decrements its parent module's live-instance
//! counter on drop, not on an explicit `close`, so the accounting is correct
//! even if a guest future is cancelled mid-call (§5 cancellation contract).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rtx_core::Resource;
use wasmtime::{Instance, Store};
use wasmtime_wasi::preview1::WasiP1Ctx;

pub struct HostState {
    pub wasi: WasiP1Ctx,
}

pub struct WasmInstance {
    pub(crate) store: Mutex<Store<HostState>>,
    pub(crate) instance: Instance,
    live_instances: Arc<AtomicUsize>,
}

impl WasmInstance {
    pub fn new(store: Store<HostState>, instance: Instance, live_instances: Arc<AtomicUsize>) -> Self {
        live_instances.fetch_add(1, Ordering::SeqCst);
        Self {
            store: Mutex::new(store),
            instance,
            live_instances,
        }
    }
}

impl Drop for WasmInstance {
    fn drop(&mut self) {
        self.live_instances.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Resource for WasmInstance {
    fn type_tag(&self) -> &'static str {
        "WasmInstance"
    }
}
