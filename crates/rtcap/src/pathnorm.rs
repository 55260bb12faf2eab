// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lexical path normalization for capability checks. Deliberately avoids
//! `std::fs::canonicalize`: a `fs.write` target usually doesn't exist yet,
//! and canonicalize requires that it does. We instead expand `~`, join
//! relative paths against the configured app root, and collapse `.`/`..`
//! components purely as strings so `./data/../secret.txt` is caught before
//! any glob match runs.

use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` (via the platform home directory), join relative
/// paths against `app_root`, and collapse `.`/`..` components lexically.
/// A `..` that would escape above the resulting root is preserved as a
/// leading `..` component rather than panicking — the caller's glob list
/// simply won't match it, which is the desired deny outcome.
pub fn normalize_path(raw: &str, app_root: &Path) -> PathBuf {
    let expanded = expand_home(raw);
    let joined = if expanded.is_absolute() {
        expanded
    } else {
        app_root.join(expanded)
    };
    collapse_dots(&joined)
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(raw)
}

fn collapse_dots(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_parent_dir_traversal() {
        let root = Path::new("/app");
        let normalized = normalize_path("./data/../secret.txt", root);
        assert_eq!(normalized, Path::new("/app/secret.txt"));
    }

    #[test]
    fn joins_relative_paths_under_app_root() {
        let root = Path::new("/app");
        assert_eq!(
            normalize_path("data/ok.txt", root),
            Path::new("/app/data/ok.txt")
        );
    }

    #[test]
    fn leaves_absolute_paths_untouched_besides_collapsing() {
        let root = Path::new("/app");
        assert_eq!(
            normalize_path("/etc/passwd", root),
            Path::new("/etc/passwd")
        );
    }

    #[test]
    fn expands_home_prefix() {
        let root = Path::new("/app");
        let home = dirs::home_dir().expect("home dir available in test environment");
        assert_eq!(
            normalize_path("~/Documents/a.txt", root),
            home.join("Documents/a.txt")
        );
    }

    #[test]
    fn cannot_escape_above_root_via_repeated_parent_dir() {
        let root = Path::new("/app");
        // Nothing left to pop once we've walked back to the root component,
        // so the leading `..` survives — it will simply fail to match any
        // granted glob rooted under `/app`.
        let normalized = normalize_path("../../etc/passwd", root);
        assert!(normalized.to_string_lossy().contains(".."));
    }
}
