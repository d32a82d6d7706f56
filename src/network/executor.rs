// file: src/network/executor.rs
// version: 2.0.0
// guid: 9798cafd-5845-4ef9-a7a5-e375cfe884e9

//! Command execution trait between provisioning steps and the host

use crate::Result;

/// Everything a step may do to the host goes through this trait
#[async_trait::async_trait]
pub trait HostExecutor: Send {
    /// Execute command, failing on non-zero exit
    async fn execute(&mut self, command: &str) -> Result<()>;

    /// Execute command and return stdout
    async fn execute_with_output(&mut self, command: &str) -> Result<String>;

    /// Execute a command intended as a boolean check
    async fn check_silent(&mut self, command: &str) -> Result<bool>;

    /// Execute command with `input` fed on stdin (secrets never hit argv)
    async fn execute_with_stdin(&mut self, command: &str, input: &str) -> Result<()>;

    /// Execute command attached to the operator's terminal; returns the exit code
    async fn execute_interactive(&mut self, command: &str) -> Result<i32>;

    /// Read a file, `None` when it does not exist
    async fn read_file(&mut self, path: &str) -> Result<Option<String>>;

    /// Write a file with the given permission bits, creating parent dirs
    async fn write_file(&mut self, path: &str, contents: &str, mode: u32) -> Result<()>;

    /// Remove a file; a missing file is not an error
    async fn remove_file(&mut self, path: &str) -> Result<()>;

    /// Download `url` to `dest`
    async fn download(&mut self, url: &str, dest: &str) -> Result<()>;

    /// Effective user id of this process
    async fn effective_uid(&mut self) -> Result<u32>;

    /// First routable IPv4 address of the host
    async fn primary_address(&mut self) -> Result<Option<String>>;
}

/// Single-quote `value` for bash
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// True when `path` exists and holds something other than whitespace
pub async fn file_has_content(exec: &mut dyn HostExecutor, path: &str) -> Result<bool> {
    Ok(exec
        .read_file(path)
        .await?
        .map(|c| !c.trim().is_empty())
        .unwrap_or(false))
}

/// Append `line` to `path` unless an identical line is already there.
/// Returns whether the file changed.
pub async fn ensure_line(
    exec: &mut dyn HostExecutor,
    path: &str,
    line: &str,
    mode: u32,
) -> Result<bool> {
    let current = exec.read_file(path).await?.unwrap_or_default();
    if current.lines().any(|l| l.trim() == line.trim()) {
        return Ok(false);
    }

    let mut updated = current;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');

    exec.write_file(path, &updated, mode).await?;
    Ok(true)
}
