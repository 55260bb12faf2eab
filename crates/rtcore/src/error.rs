// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The guest-visible error envelope and the numeric code ranges every
//! service's error enum maps into. Op names, codes, and schemas are
//! considered ABI (§4.1) — this module is the one place that fact is
//! enforced in code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable numeric code ranges, one per error family.
pub mod codes {
    pub const FILESYSTEM_BASE: u32 = 3000;
    pub const WASM_BASE: u32 = 5000;
    pub const WEBVIEW_BASE: u32 = 9000;
    pub const DEBUGGER_BASE: u32 = 9600;
}

/// Which published code range an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorFamily {
    Filesystem,
    Wasm,
    WebView,
    Debugger,
}

impl ErrorFamily {
    pub fn base(self) -> u32 {
        match self {
            ErrorFamily::Filesystem => codes::FILESYSTEM_BASE,
            ErrorFamily::Wasm => codes::WASM_BASE,
            ErrorFamily::WebView => codes::WEBVIEW_BASE,
            ErrorFamily::Debugger => codes::DEBUGGER_BASE,
        }
    }

    /// This family's own `PermissionDenied` offset, for denials the
    /// dispatcher builds directly from a `CapDenied` rather than through a
    /// service's `ErrorKind` impl. Mirrors each family's own enum: 1 for
    /// `FsError`/the WebView catch-all, 9 for `WasmError`.
    fn permission_denied_offset(self) -> u32 {
        match self {
            ErrorFamily::Wasm => 9,
            ErrorFamily::Filesystem | ErrorFamily::WebView | ErrorFamily::Debugger => 1,
        }
    }
}

/// Implemented by every service-level error enum so it can be turned into
/// the guest-visible `OpError` without the dispatcher needing to know the
/// concrete error type. The dispatcher never remaps what `code()` returns
/// (§7 propagation policy).
pub trait ErrorKind: fmt::Display {
    fn code(&self) -> u32;
    fn kind_name(&self) -> &'static str;
}

/// The structured value that crosses the guest boundary on failure:
/// `{code, kind, message}` plus the originating op name for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpError {
    pub code: u32,
    pub kind: String,
    pub message: String,
    pub op: Option<String>,
}

impl OpError {
    pub fn from_kind<E: ErrorKind>(err: &E) -> Self {
        Self {
            code: err.code(),
            kind: err.kind_name().to_string(),
            message: err.to_string(),
            op: None,
        }
    }

    /// Attach the originating op name, for diagnostics only — never
    /// consulted by machine logic, which matches on `code`.
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// A dispatcher-level failure that never reached a service: unknown op
    /// name or an argument-schema mismatch. Reuses the WebView-adjacent
    /// generic range since the dispatcher sits below every service.
    pub fn dispatch_generic(message: impl Into<String>) -> Self {
        Self {
            code: codes::WEBVIEW_BASE,
            kind: "Generic".to_string(),
            message: message.into(),
            op: None,
        }
    }

    pub fn permission_denied_webview(message: impl Into<String>) -> Self {
        Self::permission_denied(ErrorFamily::WebView, message)
    }

    /// Build a `PermissionDenied` under the code range a denied
    /// capability's family owns, so a filesystem denial surfaces
    /// `FILESYSTEM_BASE + 1` the same way `FsError::PermissionDenied` does,
    /// rather than every capability denial collapsing onto the generic
    /// WebView range regardless of which service gated the op.
    pub fn permission_denied(family: ErrorFamily, message: impl Into<String>) -> Self {
        Self {
            code: family.base() + family.permission_denied_offset(),
            kind: "PermissionDenied".to_string(),
            message: message.into(),
            op: None,
        }
    }

    pub fn invalid_handle(message: impl Into<String>) -> Self {
        Self::dispatch_generic(message)
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.code, self.kind, self.message)
    }
}

impl std::error::Error for OpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Dummy;
    impl fmt::Display for Dummy {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "dummy failure")
        }
    }
    impl ErrorKind for Dummy {
        fn code(&self) -> u32 {
            codes::FILESYSTEM_BASE + 1
        }
        fn kind_name(&self) -> &'static str {
            "PermissionDenied"
        }
    }

    #[test]
    fn from_kind_preserves_code_and_kind_verbatim() {
        let err = OpError::from_kind(&Dummy);
        assert_eq!(err.code, 3001);
        assert_eq!(err.kind, "PermissionDenied");
        assert_eq!(err.message, "dummy failure");
        assert!(err.op.is_none());
    }

    #[test]
    fn with_op_is_diagnostic_only() {
        let err = OpError::from_kind(&Dummy).with_op("read_text");
        assert_eq!(err.op.as_deref(), Some("read_text"));
    }

    #[test]
    fn family_bases_match_published_ranges() {
        assert_eq!(ErrorFamily::Filesystem.base(), 3000);
        assert_eq!(ErrorFamily::Wasm.base(), 5000);
        assert_eq!(ErrorFamily::WebView.base(), 9000);
        assert_eq!(ErrorFamily::Debugger.base(), 9600);
    }
}
