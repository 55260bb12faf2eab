// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: a rolling file appender plus an `EnvFilter` read from
//! `RTX_LOG`, the same shape as the daemon's `setup_logging`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LOG_ENV};
use crate::error::HostError;

pub fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, HostError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(HostError::NoStateDir)?,
        config.log_path.file_name().ok_or(HostError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
