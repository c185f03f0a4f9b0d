//! External tool discovery and execution
//!
//! Shared by the Chromium renderer, the edge-tts synthesizer and the ffmpeg
//! encoder. Child processes are killed if the future running them is dropped.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Locate a tool binary
///
/// An explicit path is used as-is. Otherwise, when `search_path` is set, each
/// of `candidates` is looked up on PATH in order.
pub fn discover(explicit: Option<&PathBuf>, candidates: &[&str], search_path: bool) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }
    if !search_path {
        return None;
    }
    candidates.iter().find_map(|name| which::which(name).ok())
}

/// Run `binary` with `args`, capturing output, failing on timeout or non-zero exit
pub async fn run<I, S>(binary: &Path, args: I, timeout: Duration) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = binary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.display().to_string());

    let child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::ExternalTool(format!("Failed to execute {tool}: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(Error::ExternalTool(format!("Failed to execute {tool}: {e}")));
        }
        Err(_) => {
            return Err(Error::ExternalTool(format!(
                "{tool} timed out after {} seconds",
                timeout.as_secs_f64()
            )));
        }
    };

    if !output.status.success() {
        return Err(Error::ExternalTool(format!(
            "{tool} exited with {}: {}",
            output.status,
            stderr_tail(&output.stderr)
        )));
    }

    Ok(output)
}

/// Last few lines of a tool's stderr, for error messages
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(5);
    lines[start..].join(" | ")
}
