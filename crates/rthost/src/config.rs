// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed paths under one state directory per application, the same shape
//! as the daemon's `Config::load()` but keyed by app id instead of serving
//! every project from a single user-level instance.

use std::path::PathBuf;

use crate::error::HostError;

/// Environment variable that overrides the state directory, used by tests
/// for isolation and by embedders that don't want XDG defaults.
pub const STATE_DIR_ENV: &str = "RTX_STATE_DIR";

/// Environment variable controlling log verbosity (`EnvFilter` syntax).
pub const LOG_ENV: &str = "RTX_LOG";

#[derive(Debug, Clone)]
pub struct Config {
    pub app_id: String,
    pub state_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub storage_dir: PathBuf,
}

impl Config {
    pub fn load(app_id: &str, manifest_path: PathBuf) -> Result<Self, HostError> {
        let state_dir = state_dir(app_id)?;
        Ok(Self {
            app_id: app_id.to_string(),
            lock_path: state_dir.join("host.pid"),
            log_path: state_dir.join("host.log"),
            storage_dir: state_dir.join("storage"),
            manifest_path,
            state_dir,
        })
    }
}

fn state_dir(app_id: &str) -> Result<PathBuf, HostError> {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("rtx").join(app_id));
    }

    let home = std::env::var("HOME").map_err(|_| HostError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local").join("state").join("rtx").join(app_id))
}
