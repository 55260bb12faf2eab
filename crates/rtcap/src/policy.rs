// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The policy object itself: one `Manifest` plus an app root, answering
//! `check(kind, argument)` for every gated op. `rtx-cap` doesn't know the
//! numeric error code a denial should carry in any given caller's family —
//! that's the calling service's job, so `check` returns a bare `CapDenied`
//! marker rather than a fully-formed `OpError` (see DESIGN.md).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use glob::{MatchOptions, Pattern};
use rtx_core::CapabilityKind;

use crate::manifest::Manifest;
use crate::pathnorm::normalize_path;

/// `*` matches within one path segment, `**` still crosses segment
/// boundaries under `require_literal_separator` — the `glob` crate special
/// cases consecutive `*` components (§4.1 glob semantics).
const GLOB_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Environment variable that disables all capability checks for local
/// development. Never consulted in a release build's default config path —
/// callers must opt in explicitly (§4.3 dev bypass).
pub const DEV_BYPASS_ENV: &str = "RTX_DEV_NO_CAPS";

/// A denial carrying just enough for the caller to build its own
/// family-specific `OpError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapDenied {
    pub kind: CapabilityKind,
    pub argument: Option<String>,
}

impl std::fmt::Display for CapDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.argument {
            Some(arg) => write!(
                f,
                "capability {} denied for {arg}",
                self.kind.manifest_key()
            ),
            None => write!(f, "capability {} denied", self.kind.manifest_key()),
        }
    }
}

pub struct CapabilityPolicy {
    manifest: Manifest,
    app_root: PathBuf,
    dev_bypass: AtomicBool,
}

impl CapabilityPolicy {
    pub fn new(manifest: Manifest, app_root: impl Into<PathBuf>) -> Self {
        let dev_bypass = std::env::var_os(DEV_BYPASS_ENV).is_some();
        if dev_bypass {
            tracing::warn!(
                env = DEV_BYPASS_ENV,
                "capability checks are disabled for this process; every op is implicitly granted"
            );
        }
        Self {
            manifest,
            app_root: app_root.into(),
            dev_bypass: AtomicBool::new(dev_bypass),
        }
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    /// Check a feature-flag (non glob-gated) capability: clipboard,
    /// notifications, process spawn by binary name, channel name, UI
    /// surfaces, WASM load/execute.
    pub fn check_flag(
        &self,
        kind: CapabilityKind,
        argument: Option<&str>,
    ) -> Result<(), CapDenied> {
        if self.bypassed() {
            return Ok(());
        }
        let granted = match (kind, argument) {
            (CapabilityKind::ProcessSpawn, Some(binary)) => self
                .manifest
                .names_for(kind)
                .iter()
                .any(|name| name == binary),
            (CapabilityKind::Channels, Some(channel)) => self
                .manifest
                .names_for(kind)
                .iter()
                .any(|name| name == channel),
            _ => self.manifest.flag_for(kind),
        };
        if granted {
            Ok(())
        } else {
            Err(CapDenied {
                kind,
                argument: argument.map(str::to_string),
            })
        }
    }

    /// Check a glob-gated capability (`fs.read`, `fs.write`, `net.fetch`)
    /// against a path or URL argument. Filesystem paths are normalized
    /// (home expansion, `..` collapsing, app-root join) before matching;
    /// URLs are matched as-is.
    pub fn check_path(&self, kind: CapabilityKind, path: &str) -> Result<(), CapDenied> {
        if self.bypassed() {
            return Ok(());
        }
        let globs = self.manifest.globs_for(kind).unwrap_or(&[]);
        let candidate = normalize_path(path, &self.app_root);
        let candidate_str = candidate.to_string_lossy();
        let granted = globs.iter().any(|pattern_src| {
            let normalized_pattern = normalize_path(pattern_src, &self.app_root);
            Pattern::new(&normalized_pattern.to_string_lossy())
                .map(|pattern| pattern.matches_with(&candidate_str, GLOB_MATCH_OPTIONS))
                .unwrap_or(false)
        });
        if granted {
            Ok(())
        } else {
            Err(CapDenied {
                kind,
                argument: Some(path.to_string()),
            })
        }
    }

    /// Check a glob-gated URL capability (`net.fetch`) without filesystem
    /// path normalization.
    pub fn check_url(&self, kind: CapabilityKind, url: &str) -> Result<(), CapDenied> {
        if self.bypassed() {
            return Ok(());
        }
        let globs = self.manifest.globs_for(kind).unwrap_or(&[]);
        let granted = globs.iter().any(|pattern_src| {
            Pattern::new(pattern_src)
                .map(|pattern| pattern.matches_with(url, GLOB_MATCH_OPTIONS))
                .unwrap_or(false)
        });
        if granted {
            Ok(())
        } else {
            tracing::trace!(url, "net.fetch denied: no granted pattern matched");
            Err(CapDenied {
                kind,
                argument: Some(url.to_string()),
            })
        }
    }

    fn bypassed(&self) -> bool {
        let bypassed = self.dev_bypass.load(Ordering::Relaxed);
        if bypassed {
            tracing::trace!("capability check bypassed via RTX_DEV_NO_CAPS");
        }
        bypassed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn policy(toml: &str, root: &str) -> CapabilityPolicy {
        let manifest = Manifest::parse(toml, Path::new("manifest.app.toml")).expect("parses");
        CapabilityPolicy::new(manifest, root)
    }

    #[test]
    fn glob_match_iff_allowed() {
        let p = policy(
            r#"
            [capabilities.fs]
            read = ["./data/**"]
            "#,
            "/app",
        );
        assert!(p.check_path(CapabilityKind::FsRead, "./data/ok.txt").is_ok());
        assert!(p
            .check_path(CapabilityKind::FsRead, "./secret.txt")
            .is_err());
    }

    #[test]
    fn single_star_does_not_cross_path_segments() {
        let p = policy(
            r#"
            [capabilities.fs]
            read = ["./data/*"]
            "#,
            "/app",
        );
        assert!(p.check_path(CapabilityKind::FsRead, "./data/ok.txt").is_ok());
        assert!(p
            .check_path(CapabilityKind::FsRead, "./data/nested/ok.txt")
            .is_err());
    }

    #[test]
    fn path_traversal_is_denied_after_normalization() {
        let p = policy(
            r#"
            [capabilities.fs]
            read = ["./data/**"]
            "#,
            "/app",
        );
        let denied = p
            .check_path(CapabilityKind::FsRead, "./data/../secret.txt")
            .unwrap_err();
        assert_eq!(denied.kind, CapabilityKind::FsRead);
        assert_eq!(denied.argument.as_deref(), Some("./data/../secret.txt"));
    }

    #[test]
    fn process_spawn_checks_exact_binary_name() {
        let p = policy(
            r#"
            [capabilities.process]
            spawn = ["git"]
            "#,
            "/app",
        );
        assert!(p
            .check_flag(CapabilityKind::ProcessSpawn, Some("git"))
            .is_ok());
        assert!(p
            .check_flag(CapabilityKind::ProcessSpawn, Some("rm"))
            .is_err());
    }

    #[test]
    fn missing_fs_table_denies_everything() {
        let p = policy("", "/app");
        assert!(p
            .check_path(CapabilityKind::FsRead, "./anything.txt")
            .is_err());
    }

    #[test]
    fn missing_sys_table_grants_clipboard_by_default() {
        let p = policy("", "/app");
        assert!(p.check_flag(CapabilityKind::SysClipboard, None).is_ok());
    }

    #[test]
    fn dev_bypass_grants_everything() {
        std::env::set_var(DEV_BYPASS_ENV, "1");
        let p = policy("", "/app");
        assert!(p
            .check_path(CapabilityKind::FsRead, "./anything.txt")
            .is_ok());
        std::env::remove_var(DEV_BYPASS_ENV);
    }

    #[test]
    fn net_fetch_matches_url_glob() {
        let p = policy(
            r#"
            [capabilities.net]
            fetch = ["https://api.example.com/**"]
            "#,
            "/app",
        );
        assert!(p
            .check_url(CapabilityKind::NetFetch, "https://api.example.com/v1/users")
            .is_ok());
        assert!(p
            .check_url(CapabilityKind::NetFetch, "https://evil.example.com/")
            .is_err());
    }
}
