use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, StudioError};

// Structure to represent an external tool
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTool {
    pub name: String,
    pub path: PathBuf,
}

impl ExternalTool {
    /// Resolve a tool from an explicit path or from PATH
    pub fn resolve(name: &str, configured: Option<&Path>) -> Result<Self> {
        let path = resolve_tool_path(name, configured)?;
        info!("Using {} at {}", name, path.display());
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Run the tool and collect its output
    pub async fn output<I, S>(&self, args: I, stdin: Option<&[u8]>) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        run_command(&self.path, args, stdin).await
    }
}

/// Check if a command is available, preferring the configured path
pub fn resolve_tool_path(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(StudioError::ToolNotFound(format!(
            "{} not found at {}",
            name,
            path.display()
        )));
    }

    which::which(name)
        .map_err(|e| StudioError::ToolNotFound(format!("{} not found in PATH: {}", name, e)))
}

/// Run an external command, optionally feeding stdin
pub async fn run_command<I, S>(program: &Path, args: I, stdin: Option<&[u8]>) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Running {}", program.display());
    let mut child = command.spawn()?;

    // stdin пишется параллельно чтению stdout, иначе возможна взаимоблокировка
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let data = input.to_vec();
            Some(tokio::spawn(async move { pipe.write_all(&data).await }))
        }
        _ => None,
    };

    let output = child.wait_with_output().await?;

    if let Some(writer) = writer {
        writer.await.map_err(std::io::Error::other)??;
    }

    Ok(output)
}

/// Describe a failed process run using the tail of its stderr
pub fn describe_failure(tool: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
    format!("{} failed with status {}: {}", tool, output.status, last_line.trim())
}
