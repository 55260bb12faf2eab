//! End-to-end specifications for the runtime host.
//!
//! Unlike each service crate's own unit tests, these boot the full
//! `rtx-host` service stack behind one `Dispatcher` and exercise it the
//! way an embedding JS engine would: dispatch by op name, inspect the
//! guest-visible JSON envelope.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/watcher_basics.rs"]
mod watcher_basics;
#[path = "specs/fs_basics.rs"]
mod fs_basics;
#[path = "specs/capability_deny.rs"]
mod capability_deny;
#[path = "specs/wasm_add.rs"]
mod wasm_add;
#[path = "specs/wasm_memory.rs"]
mod wasm_memory;
#[path = "specs/debugger_pause.rs"]
mod debugger_pause;
#[path = "specs/debugger_disconnect.rs"]
mod debugger_disconnect;
