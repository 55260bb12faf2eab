// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure op bodies, one function per entry in the filesystem op list (§6).
//! Kept free of dispatcher/capability concerns so they're directly unit
//! testable; `handlers.rs` wires capability extraction and argument
//! parsing around these.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FsError;

pub async fn read_text(path: &Path) -> Result<String, FsError> {
    Ok(tokio::fs::read_to_string(path).await?)
}

pub async fn write_text(path: &Path, contents: &str) -> Result<(), FsError> {
    Ok(tokio::fs::write(path, contents).await?)
}

pub async fn read_bytes(path: &Path) -> Result<Vec<u8>, FsError> {
    Ok(tokio::fs::read(path).await?)
}

pub async fn write_bytes(path: &Path, contents: &[u8]) -> Result<(), FsError> {
    Ok(tokio::fs::write(path, contents).await?)
}

pub async fn append_text(path: &Path, contents: &str) -> Result<(), FsError> {
    append_bytes(path, contents.as_bytes()).await
}

pub async fn append_bytes(path: &Path, contents: &[u8]) -> Result<(), FsError> {
    use tokio::io::AsyncWriteExt;
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    pub is_file: bool,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub readonly: bool,
    pub modified_ms: Option<u64>,
}

pub async fn stat(path: &Path) -> Result<Metadata, FsError> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    let modified_ms = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64);
    Ok(Metadata {
        is_file: meta.is_file(),
        is_dir: meta.is_dir(),
        is_symlink: meta.file_type().is_symlink(),
        size: meta.len(),
        readonly: meta.permissions().readonly(),
        modified_ms,
    })
}

pub async fn metadata(path: &Path) -> Result<Metadata, FsError> {
    // `stat` follows symlinks for file-type classification via
    // `symlink_metadata`'s own type bits; `metadata` follows the link and
    // reports the target, matching the distinction in most host runtimes'
    // fs modules.
    let meta = tokio::fs::metadata(path).await?;
    let modified_ms = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64);
    Ok(Metadata {
        is_file: meta.is_file(),
        is_dir: meta.is_dir(),
        is_symlink: false,
        size: meta.len(),
        readonly: meta.permissions().readonly(),
        modified_ms,
    })
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
    pub size: u64,
}

pub async fn read_dir(path: &Path) -> Result<Vec<DirEntry>, FsError> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut out = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = tokio::fs::symlink_metadata(entry.path()).await?;
        out.push(DirEntry {
            name,
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            is_symlink: meta.file_type().is_symlink(),
            size: meta.len(),
        });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

pub async fn mkdir(path: &Path, recursive: bool) -> Result<(), FsError> {
    if recursive {
        tokio::fs::create_dir_all(path).await?;
    } else {
        tokio::fs::create_dir(path).await?;
    }
    Ok(())
}

pub async fn remove(path: &Path, recursive: bool) -> Result<(), FsError> {
    let meta = tokio::fs::symlink_metadata(path).await?;
    if meta.is_dir() {
        if recursive {
            tokio::fs::remove_dir_all(path).await?;
        } else {
            tokio::fs::remove_dir(path).await?;
        }
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(())
}

pub async fn rename(from: &Path, to: &Path) -> Result<(), FsError> {
    Ok(tokio::fs::rename(from, to).await?)
}

pub async fn copy(from: &Path, to: &Path) -> Result<u64, FsError> {
    Ok(tokio::fs::copy(from, to).await?)
}

pub async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

pub async fn symlink(original: &Path, link: &Path) -> Result<(), FsError> {
    #[cfg(unix)]
    {
        tokio::fs::symlink(original, link)
            .await
            .map_err(|e| FsError::SymlinkError(e.to_string()))
    }
    #[cfg(not(unix))]
    {
        let _ = (original, link);
        Err(FsError::SymlinkError(
            "symlink creation is unsupported on this platform".to_string(),
        ))
    }
}

pub async fn read_link(path: &Path) -> Result<String, FsError> {
    let target = tokio::fs::read_link(path).await?;
    Ok(target.display().to_string())
}

pub async fn real_path(path: &Path) -> Result<String, FsError> {
    let canon = tokio::fs::canonicalize(path).await?;
    Ok(canon.display().to_string())
}

pub async fn temp_file(prefix: Option<&str>, suffix: Option<&str>) -> Result<String, FsError> {
    let dir = std::env::temp_dir();
    let unique = rtx_core::IdGen::next(&rtx_core::UuidIdGen);
    let name = format!("{}{}{}", prefix.unwrap_or(""), unique, suffix.unwrap_or(""));
    let path: PathBuf = dir.join(name);
    tokio::fs::File::create(&path)
        .await
        .map_err(|e| FsError::TempError(e.to_string()))?;
    Ok(path.display().to_string())
}

pub async fn temp_dir(prefix: Option<&str>) -> Result<String, FsError> {
    let dir = std::env::temp_dir();
    let unique = rtx_core::IdGen::next(&rtx_core::UuidIdGen);
    let path = dir.join(format!("{}{}", prefix.unwrap_or(""), unique));
    tokio::fs::create_dir(&path)
        .await
        .map_err(|e| FsError::TempError(e.to_string()))?;
    Ok(path.display().to_string())
}

pub fn parse_path_arg(args: &Value, field: &str) -> Result<PathBuf, FsError> {
    args.get(field)
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .ok_or_else(|| FsError::IoError(format!("missing `{field}` argument")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_text_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        write_text(&path, "hello").await.expect("write");
        let got = read_text(&path).await.expect("read");
        assert_eq!(got, "hello");
    }

    #[tokio::test]
    async fn append_text_appends_without_truncating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        write_text(&path, "a").await.expect("write");
        append_text(&path, "b").await.expect("append");
        assert_eq!(read_text(&path).await.expect("read"), "ab");
    }

    #[tokio::test]
    async fn mkdir_recursive_creates_intermediate_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b/c");
        mkdir(&nested, true).await.expect("mkdir");
        assert!(exists(&nested).await);
    }

    #[tokio::test]
    async fn remove_recursive_removes_nonempty_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a/b");
        mkdir(&nested, true).await.expect("mkdir");
        remove(dir.path().join("a").as_path(), true)
            .await
            .expect("remove");
        assert!(!exists(&dir.path().join("a")).await);
    }

    #[tokio::test]
    async fn stat_reports_file_kind_and_size() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        write_text(&path, "hello").await.expect("write");
        let meta = stat(&path).await.expect("stat");
        assert!(meta.is_file);
        assert_eq!(meta.size, 5);
    }

    #[tokio::test]
    async fn read_dir_lists_entries_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_text(&dir.path().join("b.txt"), "hi").await.expect("write");
        mkdir(&dir.path().join("a_dir"), false).await.expect("mkdir");
        let entries = read_dir(dir.path()).await.expect("read_dir");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a_dir");
        assert!(entries[0].is_dir);
        assert!(!entries[0].is_file);
        assert_eq!(entries[1].name, "b.txt");
        assert!(entries[1].is_file);
        assert_eq!(entries[1].size, 2);
    }

    #[tokio::test]
    async fn read_text_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_text(&dir.path().join("missing.txt")).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }
}
