// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds a `WasiP1Ctx` from the guest-supplied `wasiCfg` argument,
//! checking `fs.read` for every preopen before the directory is ever
//! opened (§4.5: "each preopen must clear `fs.read`... or fails
//! `PermissionDenied`").

use rtx_cap::CapabilityPolicy;
use rtx_core::CapabilityKind;
use serde::Deserialize;
use wasmtime_wasi::preview1::WasiP1Ctx;
use wasmtime_wasi::p2::WasiCtxBuilder;
use wasmtime_wasi::{DirPerms, FilePerms};

use crate::error::WasmError;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PreopenArg {
    pub host_path: String,
    pub guest_path: String,
    pub readonly: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct WasiConfigArg {
    pub preopens: Vec<PreopenArg>,
    pub env: Vec<(String, String)>,
    pub args: Vec<String>,
    pub inherit_stdin: bool,
    pub inherit_stdout: bool,
    pub inherit_stderr: bool,
}

/// `cfg = None` yields a maximally restricted context: no preopens, no
/// inherited stdio, no args or env. A module that imports WASI functions
/// but was instantiated without a `wasiCfg` simply has nothing to reach.
pub fn build_wasi_ctx(cfg: Option<WasiConfigArg>, policy: &CapabilityPolicy) -> Result<WasiP1Ctx, WasmError> {
    let mut builder = WasiCtxBuilder::new();
    if let Some(cfg) = cfg {
        if !cfg.env.is_empty() {
            builder.envs(&cfg.env);
        }
        if !cfg.args.is_empty() {
            builder.args(&cfg.args);
        }
        if cfg.inherit_stdin {
            builder.inherit_stdin();
        }
        if cfg.inherit_stdout {
            builder.inherit_stdout();
        }
        if cfg.inherit_stderr {
            builder.inherit_stderr();
        }
        for preopen in &cfg.preopens {
            policy
                .check_path(CapabilityKind::FsRead, &preopen.host_path)
                .map_err(|denied| WasmError::PermissionDenied(denied.to_string()))?;
            let (dir_perms, file_perms) = if preopen.readonly {
                (DirPerms::READ, FilePerms::READ)
            } else {
                (DirPerms::all(), FilePerms::all())
            };
            builder
                .preopened_dir(&preopen.host_path, &preopen.guest_path, dir_perms, file_perms)
                .map_err(|e| WasmError::WasiError(e.to_string()))?;
        }
    }
    Ok(builder.build_p1())
}
