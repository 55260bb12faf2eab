// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rtx-net: the Network Service. `fetch`/`fetch_bytes`/`fetch_json`/
//! `post_json` over `reqwest`, gated by `net.fetch`'s URL glob list.
//! TLS itself is delegated to `reqwest`'s rustls backend per the Non-goal
//! excluding a hand-rolled TLS stack.

mod error;
mod handlers;
mod ops;

pub use error::NetError;
pub use handlers::register;

use reqwest::Client;

/// Build the shared HTTP client used by every `fetch*` op.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .build()
}
