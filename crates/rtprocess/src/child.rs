// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ChildProcess`: a resource-table entry wrapping a `tokio::process::Child`
//! with independently piped/inherited/null stdio streams (§3 Child Process
//! entity, §4.6 per-stream stdio mode contract).

use std::process::Stdio;

use rtx_core::Resource;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

use crate::error::ProcessError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StdioMode {
    Piped,
    Inherit,
    Null,
}

impl Default for StdioMode {
    fn default() -> Self {
        StdioMode::Inherit
    }
}

impl StdioMode {
    fn into_stdio(self) -> Stdio {
        match self {
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SpawnOptions {
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub stdin: StdioMode,
    #[serde(default)]
    pub stdout: StdioMode,
    #[serde(default)]
    pub stderr: StdioMode,
}

pub struct ChildProcess {
    pub pid: u32,
    child: Mutex<Child>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr: Mutex<Option<tokio::process::ChildStderr>>,
}

impl ChildProcess {
    pub fn spawn(bin: &str, opts: &SpawnOptions) -> Result<Self, ProcessError> {
        let mut command = tokio::process::Command::new(bin);
        command
            .args(&opts.args)
            .stdin(opts.stdin.into_stdio())
            .stdout(opts.stdout.into_stdio())
            .stderr(opts.stderr.into_stdio());
        for (key, value) in &opts.env {
            command.env(key, value);
        }
        if let Some(cwd) = &opts.cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(e.to_string()))?;
        let pid = child.id().unwrap_or_default();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(Self {
            pid,
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(stdout),
            stderr: Mutex::new(stderr),
        })
    }

    pub async fn write_stdin(&self, data: &[u8]) -> Result<(), ProcessError> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard.as_mut().ok_or(ProcessError::StreamNotPiped)?;
        stdin
            .write_all(data)
            .await
            .map_err(|e| ProcessError::Generic(e.to_string()))
    }

    pub async fn read_stdout(&self, max_bytes: usize) -> Result<(Vec<u8>, bool), ProcessError> {
        let mut guard = self.stdout.lock().await;
        let stdout = guard.as_mut().ok_or(ProcessError::StreamNotPiped)?;
        read_chunk(stdout, max_bytes).await
    }

    pub async fn read_stderr(&self, max_bytes: usize) -> Result<(Vec<u8>, bool), ProcessError> {
        let mut guard = self.stderr.lock().await;
        let stderr = guard.as_mut().ok_or(ProcessError::StreamNotPiped)?;
        read_chunk(stderr, max_bytes).await
    }

    pub async fn wait(&self) -> Result<i32, ProcessError> {
        let mut guard = self.child.lock().await;
        let status = guard
            .wait()
            .await
            .map_err(|e| ProcessError::Generic(e.to_string()))?;
        Ok(exit_code(status))
    }

    pub async fn status(&self) -> Result<Option<i32>, ProcessError> {
        let mut guard = self.child.lock().await;
        match guard
            .try_wait()
            .map_err(|e| ProcessError::Generic(e.to_string()))?
        {
            Some(status) => Ok(Some(exit_code(status))),
            None => Ok(None),
        }
    }

    pub async fn kill(&self) -> Result<(), ProcessError> {
        let mut guard = self.child.lock().await;
        guard
            .kill()
            .await
            .map_err(|e| ProcessError::Generic(e.to_string()))
    }
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().unwrap_or_else(|| -status.signal().unwrap_or(0))
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(-1)
    }
}

async fn read_chunk<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut R,
    max_bytes: usize,
) -> Result<(Vec<u8>, bool), ProcessError> {
    let mut buf = vec![0u8; max_bytes.max(1)];
    match reader.read(&mut buf).await {
        Ok(0) => Ok((Vec::new(), true)),
        Ok(n) => {
            buf.truncate(n);
            Ok((buf, false))
        }
        Err(e) => Err(ProcessError::Generic(e.to_string())),
    }
}

impl Resource for ChildProcess {
    fn close(&self) {
        // Best-effort: dropping the `Child` already reaps the process if
        // it has exited; an explicit `kill` here would orphan an
        // already-collected zombie's wait status on some platforms, so we
        // leave teardown to the OS (matching `fs2`-less ChildProcess
        // drop semantics tokio itself relies on).
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_true_exits_zero() {
        let opts = SpawnOptions::default();
        let child = ChildProcess::spawn("true", &opts).expect("spawn");
        let code = child.wait().await.expect("wait");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn piped_stdout_is_readable() {
        let mut opts = SpawnOptions::default();
        opts.args = vec!["-c".into(), "echo hi".into()];
        opts.stdout = StdioMode::Piped;
        let child = ChildProcess::spawn("sh", &opts).expect("spawn");
        let (data, _eof) = child.read_stdout(64).await.expect("read");
        assert_eq!(String::from_utf8_lossy(&data).trim(), "hi");
    }

    #[tokio::test]
    async fn unpiped_stdin_write_fails() {
        let opts = SpawnOptions::default();
        let child = ChildProcess::spawn("true", &opts).expect("spawn");
        let err = child.write_stdin(b"x").await.unwrap_err();
        assert!(matches!(err, ProcessError::StreamNotPiped));
    }
}
