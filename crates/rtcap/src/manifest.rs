// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `manifest.app.toml` deserialization. Every section is optional — an
//! absent key falls back to `CapabilityKind::default_allow()`, not to an
//! empty grant list, so a missing `[capabilities.sys]` table still grants
//! clipboard/notifications while a missing `[capabilities.fs]` denies
//! everything (§3 Capability Grant invariants).

use std::path::Path;

use rtx_core::CapabilityKind;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub capabilities: CapabilitiesSection,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, ManifestError> {
        toml::from_str(raw).map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The glob list granted for a glob-gated capability, or `None` if the
    /// capability isn't glob-gated at all.
    pub fn globs_for(&self, kind: CapabilityKind) -> Option<&[String]> {
        match kind {
            CapabilityKind::FsRead => Some(&self.capabilities.fs.read),
            CapabilityKind::FsWrite => Some(&self.capabilities.fs.write),
            CapabilityKind::NetFetch => Some(&self.capabilities.net.fetch),
            _ => None,
        }
    }

    /// The boolean grant for a feature-flag capability. Returns the
    /// manifest's explicit `allowed` field when the capability provides a
    /// flag struct, otherwise the capability's published default.
    pub fn flag_for(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::SysClipboard => self
                .capabilities
                .sys
                .clipboard
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::SysNotifications => self
                .capabilities
                .sys
                .notifications
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::ProcessSpawn => !self.capabilities.process.spawn.is_empty(),
            CapabilityKind::UiWindows => self
                .capabilities
                .ui
                .windows
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::UiMenus => self
                .capabilities
                .ui
                .menus
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::UiDialogs => self
                .capabilities
                .ui
                .dialogs
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::UiTray => self
                .capabilities
                .ui
                .tray
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::WasmLoad => self
                .capabilities
                .wasm
                .load
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::WasmExecute => self
                .capabilities
                .wasm
                .execute
                .unwrap_or_else(|| kind.default_allow()),
            CapabilityKind::Channels => !self.capabilities.channels.allowed.is_empty(),
            CapabilityKind::FsRead | CapabilityKind::FsWrite | CapabilityKind::NetFetch => {
                unreachable!("glob-gated capability has no boolean flag")
            }
        }
    }

    /// The binary-name or channel-name allow list for list-gated flag
    /// capabilities (`process.spawn`, `channels.allowed`).
    pub fn names_for(&self, kind: CapabilityKind) -> &[String] {
        match kind {
            CapabilityKind::ProcessSpawn => &self.capabilities.process.spawn,
            CapabilityKind::Channels => &self.capabilities.channels.allowed,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilitiesSection {
    #[serde(default)]
    pub fs: FsCaps,
    #[serde(default)]
    pub net: NetCaps,
    #[serde(default)]
    pub sys: SysCaps,
    #[serde(default)]
    pub process: ProcessCaps,
    #[serde(default)]
    pub channels: ChannelsCaps,
    #[serde(default)]
    pub ui: UiCaps,
    #[serde(default)]
    pub wasm: WasmCaps,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FsCaps {
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub write: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetCaps {
    #[serde(default)]
    pub fetch: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SysCaps {
    pub clipboard: Option<bool>,
    pub notifications: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessCaps {
    #[serde(default)]
    pub spawn: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsCaps {
    #[serde(default)]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiCaps {
    pub windows: Option<bool>,
    pub menus: Option<bool>,
    pub dialogs: Option<bool>,
    pub tray: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WasmCaps {
    pub load: Option<bool>,
    pub execute: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_manifest_denies_fs_and_net_but_keeps_ui_defaults() {
        let m = Manifest::default();
        assert!(m.globs_for(CapabilityKind::FsRead).unwrap().is_empty());
        assert!(m.flag_for(CapabilityKind::UiWindows));
        assert!(!m.flag_for(CapabilityKind::UiTray));
    }

    #[test]
    fn parses_full_manifest() {
        let raw = r#"
            [capabilities.fs]
            read = ["~/Documents/**", "./data/**"]
            write = ["./data/**"]

            [capabilities.net]
            fetch = ["https://api.example.com/**"]

            [capabilities.sys]
            clipboard = false

            [capabilities.process]
            spawn = ["git", "ls"]

            [capabilities.ui]
            tray = true
        "#;
        let m = Manifest::parse(raw, Path::new("manifest.app.toml")).expect("parses");
        assert_eq!(
            m.globs_for(CapabilityKind::FsRead).unwrap(),
            &["~/Documents/**".to_string(), "./data/**".to_string()]
        );
        assert!(!m.flag_for(CapabilityKind::SysClipboard));
        assert!(m.flag_for(CapabilityKind::ProcessSpawn));
        assert_eq!(m.names_for(CapabilityKind::ProcessSpawn), &["git", "ls"]);
        assert!(m.flag_for(CapabilityKind::UiTray));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Manifest::parse("not = [valid", Path::new("manifest.app.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
