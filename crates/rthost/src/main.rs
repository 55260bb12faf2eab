// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rtxd: the runtime host process.
//!
//! Embeds the capability-gated op dispatcher that a JS engine integration
//! calls into; this binary's own job is startup, logging, and graceful
//! shutdown. It is typically launched by the surrounding desktop app
//! framework, one instance per application data directory.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use rtx_host::{setup_logging, startup, Config, HostError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut app_id = None;
    let mut manifest_path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("rtxd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            "--app-id" => {
                app_id = args.next();
            }
            "--manifest" => {
                manifest_path = args.next().map(PathBuf::from);
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                print_help();
                std::process::exit(1);
            }
        }
    }

    let app_id = app_id.unwrap_or_else(|| "default".to_string());
    let manifest_path = manifest_path.unwrap_or_else(|| PathBuf::from("manifest.app.toml"));

    let config = Config::load(&app_id, manifest_path)?;
    let log_guard = setup_logging(&config)?;

    info!(app_id = %config.app_id, "starting runtime host");

    let state = match startup(config).await {
        Ok(state) => state,
        Err(HostError::LockFailed(path, e)) => {
            eprintln!("rtxd is already running for this application (lock: {})", path.display());
            drop(log_guard);
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
        Err(e) => {
            error!("failed to start runtime host: {e}");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("runtime host ready");
    println!("READY");

    loop {
        tokio::select! {
            _ = state.shutdown.notified() => {
                info!("shutdown requested via op");
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
        }
    }

    state.shutdown_requested.store(true, Ordering::SeqCst);
    info!("runtime host stopped");
    Ok(())
}

fn print_help() {
    println!("rtxd {}", env!("CARGO_PKG_VERSION"));
    println!("Capability-gated native extension runtime host");
    println!();
    println!("USAGE:");
    println!("    rtxd [--app-id <id>] [--manifest <path>]");
    println!();
    println!("OPTIONS:");
    println!("    --app-id <id>        Application identifier (default: \"default\")");
    println!("    --manifest <path>    Path to manifest.app.toml (default: ./manifest.app.toml)");
    println!("    -h, --help           Print help information");
    println!("    -v, --version        Print version information");
}
