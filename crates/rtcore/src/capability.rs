// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The vocabulary of capability kinds. Lives in `rtx-core` (rather than in
//! the policy crate) because both `rtx-cap` (which answers yes/no) and
//! `rtx-dispatch` (which asks the question before deserializing heavy
//! arguments) need to name the same closed set without a circular
//! dependency.

use serde::{Deserialize, Serialize};

use crate::error::ErrorFamily;

/// A capability an op may require before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    FsRead,
    FsWrite,
    NetFetch,
    SysClipboard,
    SysNotifications,
    ProcessSpawn,
    UiWindows,
    UiMenus,
    UiDialogs,
    UiTray,
    WasmLoad,
    WasmExecute,
    Channels,
}

impl CapabilityKind {
    /// Whether this capability is gated by a glob list over a path-or-URL
    /// argument (as opposed to a plain boolean feature flag).
    pub fn is_glob_gated(self) -> bool {
        matches!(
            self,
            CapabilityKind::FsRead | CapabilityKind::FsWrite | CapabilityKind::NetFetch
        )
    }

    /// The manifest default when the key is entirely absent (§3 Capability
    /// Grant invariants): `ui.tray` defaults to false, all other UI
    /// capabilities and feature flags default to true, fs/net default deny.
    pub fn default_allow(self) -> bool {
        match self {
            CapabilityKind::FsRead
            | CapabilityKind::FsWrite
            | CapabilityKind::NetFetch
            | CapabilityKind::ProcessSpawn
            | CapabilityKind::WasmLoad
            | CapabilityKind::WasmExecute
            | CapabilityKind::Channels
            | CapabilityKind::UiTray => false,
            CapabilityKind::SysClipboard
            | CapabilityKind::SysNotifications
            | CapabilityKind::UiWindows
            | CapabilityKind::UiMenus
            | CapabilityKind::UiDialogs => true,
        }
    }

    /// Which error family's code range a denial of this capability should
    /// surface under, so the dispatcher can build a `PermissionDenied`
    /// without each service overriding anything per op (§7 propagation
    /// policy). Capabilities outside the filesystem/wasm ranges fall back
    /// to the WebView family's generic codes, same as every other
    /// dispatcher-level failure those services don't have a range for.
    pub fn error_family(self) -> ErrorFamily {
        match self {
            CapabilityKind::FsRead | CapabilityKind::FsWrite => ErrorFamily::Filesystem,
            CapabilityKind::WasmLoad | CapabilityKind::WasmExecute => ErrorFamily::Wasm,
            _ => ErrorFamily::WebView,
        }
    }

    pub fn manifest_key(self) -> &'static str {
        match self {
            CapabilityKind::FsRead => "fs.read",
            CapabilityKind::FsWrite => "fs.write",
            CapabilityKind::NetFetch => "net.fetch",
            CapabilityKind::SysClipboard => "sys.clipboard",
            CapabilityKind::SysNotifications => "sys.notifications",
            CapabilityKind::ProcessSpawn => "process.spawn",
            CapabilityKind::UiWindows => "ui.windows",
            CapabilityKind::UiMenus => "ui.menus",
            CapabilityKind::UiDialogs => "ui.dialogs",
            CapabilityKind::UiTray => "ui.tray",
            CapabilityKind::WasmLoad => "wasm.load",
            CapabilityKind::WasmExecute => "wasm.execute",
            CapabilityKind::Channels => "channels",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ui_tray_default_contradicts_other_ui_defaults() {
        // Flagged for review in DESIGN.md, preserved as specified.
        assert!(!CapabilityKind::UiTray.default_allow());
        assert!(CapabilityKind::UiWindows.default_allow());
        assert!(CapabilityKind::UiMenus.default_allow());
        assert!(CapabilityKind::UiDialogs.default_allow());
    }

    #[test]
    fn fs_and_net_default_deny() {
        assert!(!CapabilityKind::FsRead.default_allow());
        assert!(!CapabilityKind::FsWrite.default_allow());
        assert!(!CapabilityKind::NetFetch.default_allow());
    }

    #[test]
    fn only_path_and_url_kinds_are_glob_gated() {
        assert!(CapabilityKind::FsRead.is_glob_gated());
        assert!(CapabilityKind::NetFetch.is_glob_gated());
        assert!(!CapabilityKind::SysClipboard.is_glob_gated());
        assert!(!CapabilityKind::ProcessSpawn.is_glob_gated());
    }
}
