// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-crypto: the Crypto Service. `random_bytes`/`random_uuid`/`hash`/
//! `encrypt`/`decrypt`/`derive_key` (§6). Ungated — the capability
//! vocabulary (§3) has no crypto entry, so every op here runs
//! unconditionally once dispatched.

mod error;
mod handlers;
mod ops;

pub use error::CryptoError;
pub use handlers::register;
