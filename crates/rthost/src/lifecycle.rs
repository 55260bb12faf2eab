// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup: acquire the lock file, load the manifest, build every service's
//! state, and wire all of it into one `OpRegistry`/`OpContext` pair. Mirrors
//! the daemon's `lifecycle::startup` (lock-first, directories second) minus
//! the WAL/event-bus machinery this runtime has no use for.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use rtx_cap::{CapabilityPolicy, Manifest};
use rtx_core::ResourceTable;
use rtx_dispatch::{Dispatcher, OpContext, OpRegistry};
use tokio::sync::Notify;
use tracing::info;

use crate::config::Config;
use crate::error::HostError;

/// Everything the host loop needs once startup succeeds. The lock file is
/// held open for the process lifetime; dropping it releases the lock.
pub struct HostState {
    pub config: Config,
    pub dispatcher: Dispatcher,
    pub shutdown: Arc<Notify>,
    pub shutdown_requested: Arc<AtomicBool>,
    pub start_time: Instant,
    #[allow(dead_code)]
    lock_file: File,
}

pub async fn startup(config: Config) -> Result<HostState, HostError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = acquire_lock(&config.lock_path)?;

    let manifest = Manifest::load(&config.manifest_path)?;
    let app_root = config.manifest_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let policy = Arc::new(CapabilityPolicy::new(manifest, app_root));
    let resources = Arc::new(ResourceTable::new());
    let ctx = OpContext::new(policy, resources);

    let mut registry = OpRegistry::new();

    rtx_fs::register(&mut registry);
    rtx_process::register(&mut registry);
    rtx_crypto::register(&mut registry);

    let store = Arc::new(rtx_storage::KvStore::open(&config.storage_dir, &config.app_id)?);
    rtx_storage::register(&mut registry, store);

    let net_client = rtx_net::build_client()?;
    rtx_net::register(&mut registry, net_client);

    let wasm_runtime = Arc::new(rtx_wasm::WasmRuntime::new().map_err(|e| HostError::WasmInit(e.to_string()))?);
    rtx_wasm::register(&mut registry, wasm_runtime);

    let debugger_session = Arc::new(rtx_debugger::DebuggerSession::spawn());
    rtx_debugger::register(&mut registry, debugger_session);

    let shutdown = Arc::new(Notify::new());
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    crate::host_ops::register(&mut registry, Instant::now(), Arc::clone(&shutdown), Arc::clone(&shutdown_requested));

    info!(app_id = %config.app_id, ops = registry.op_names().count(), "runtime host services registered");

    let dispatcher = Dispatcher::new(registry, ctx);

    Ok(HostState {
        config,
        dispatcher,
        shutdown,
        shutdown_requested,
        start_time: Instant::now(),
        lock_file,
    })
}

fn acquire_lock(lock_path: &Path) -> Result<File, HostError> {
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| HostError::LockFailed(lock_path.to_path_buf(), e))?;
    lock_file
        .try_lock_exclusive()
        .map_err(|e| HostError::LockFailed(lock_path.to_path_buf(), e))?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}
