// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-process: the Process Service. `spawn`/`kill`/`wait`/`status`/stdio
//! ops over `tokio::process`, gated by `process.spawn`'s binary-name list.

mod child;
mod error;
mod handlers;

pub use child::{ChildProcess, SpawnOptions, StdioMode};
pub use error::ProcessError;
pub use handlers::register;
