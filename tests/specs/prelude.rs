//! Shared setup for end-to-end runtime host specifications.
//!
//! Each scenario spins up a real `rtx_host::startup` with an isolated
//! state directory and a manifest written for that test, then drives the
//! whole service stack through `Dispatcher::dispatch` the way a JS engine
//! embedding this runtime would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::PathBuf;

use rtx_host::{startup, Config, HostState};

pub struct Harness {
    pub state: HostState,
    _tmp: tempfile::TempDir,
}

impl Harness {
    /// Boot a host with the given manifest body and an app root the
    /// manifest's relative globs are resolved against.
    pub async fn start(manifest: &str) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state_dir = tmp.path().join("state");
        std::env::set_var("RTX_STATE_DIR", &state_dir);

        let manifest_path = tmp.path().join("manifest.app.toml");
        std::fs::write(&manifest_path, manifest).expect("write manifest");

        let config = Config::load("spec-app", manifest_path).expect("config loads");
        let state = startup(config).await.expect("startup succeeds");

        std::env::remove_var("RTX_STATE_DIR");
        Self { state, _tmp: tmp }
    }

    pub fn root(&self) -> PathBuf {
        self._tmp.path().to_path_buf()
    }
}

pub fn compile_args(wat: &str) -> serde_json::Value {
    use base64::Engine as _;
    let bytes = wat::parse_str(wat).expect("valid wat");
    serde_json::json!({ "bytes": base64::engine::general_purpose::STANDARD.encode(bytes) })
}
