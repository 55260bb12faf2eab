// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-host: the process entry point. Acquires the per-application lock
//! file, loads the capability manifest, wires every service's op family
//! into one registry, and drives a `tokio::select!` host loop until a
//! shutdown signal (`SIGTERM`/`SIGINT` or the `shutdown` op) is observed.

mod config;
mod error;
mod host_ops;
mod lifecycle;
mod logging;

pub use config::Config;
pub use error::HostError;
pub use lifecycle::{startup, HostState};
pub use logging::setup_logging;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_manifest(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("manifest.app.toml");
        let mut file = std::fs::File::create(&path).expect("create manifest");
        writeln!(
            file,
            "[capabilities.fs]\nread = [\"~/docs/**\"]\n\n[capabilities.net]\nfetch = []\n"
        )
        .expect("write manifest");
        path
    }

    #[tokio::test]
    async fn startup_registers_every_service_op_family() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state_dir = tmp.path().join("state");
        std::env::set_var(config::STATE_DIR_ENV, &state_dir);
        let manifest_path = write_manifest(tmp.path());

        let config = Config::load("test-app", manifest_path).expect("config loads");
        let state = startup(config).await.expect("startup succeeds");

        let result = state.dispatcher.dispatch("ping", json!({})).await.expect("ping dispatches");
        assert_eq!(result, json!({ "pong": true }));

        let status = state.dispatcher.dispatch("status", json!({})).await.expect("status dispatches");
        assert!(status["version"].is_string());

        std::env::remove_var(config::STATE_DIR_ENV);
    }

    #[tokio::test]
    async fn a_second_startup_against_the_same_state_dir_fails_the_lock() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state_dir = tmp.path().join("state");
        std::env::set_var(config::STATE_DIR_ENV, &state_dir);
        let manifest_path = write_manifest(tmp.path());

        let first = Config::load("test-app", manifest_path.clone()).expect("config loads");
        let _held = startup(first).await.expect("first startup succeeds");

        let second = Config::load("test-app", manifest_path).expect("config loads");
        let result = startup(second).await;
        assert!(matches!(result, Err(HostError::LockFailed(_, _))));

        std::env::remove_var(config::STATE_DIR_ENV);
    }

    #[tokio::test]
    async fn shutdown_op_wakes_the_notify_handle() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let state_dir = tmp.path().join("state");
        std::env::set_var(config::STATE_DIR_ENV, &state_dir);
        let manifest_path = write_manifest(tmp.path());

        let config = Config::load("test-app", manifest_path).expect("config loads");
        let state = startup(config).await.expect("startup succeeds");
        let shutdown = state.shutdown.clone();

        let notified = shutdown.notified();
        state.dispatcher.dispatch("shutdown", json!({})).await.expect("shutdown dispatches");
        tokio::time::timeout(std::time::Duration::from_secs(1), notified)
            .await
            .expect("shutdown notify fires");

        std::env::remove_var(config::STATE_DIR_ENV);
    }
}
