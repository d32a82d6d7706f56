// file: src/network/local.rs
// version: 2.1.0
// guid: 2edc345b-77d9-4eba-b6fd-2fd5f83d548e

//! Local command execution for on-machine provisioning

use super::download::NetworkDownloader;
use super::executor::HostExecutor;
use crate::error::HardenError;
use crate::Result;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use std::os::unix::fs::PermissionsExt;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error};

/// Executes everything on the machine this process runs on
pub struct LocalClient {
    downloader: NetworkDownloader,
}

impl LocalClient {
    /// Create a new local client
    pub fn new() -> Self {
        Self {
            downloader: NetworkDownloader::new(),
        }
    }

    async fn run(command: &str) -> Result<Output> {
        Command::new("bash")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| HardenError::spawn(command, e))
    }

    fn check_output(command: &str, output: &Output) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        let exit_code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        error!("Command failed with exit code {:?}: {}", exit_code, command);
        if !stdout.trim().is_empty() {
            error!("STDOUT: {}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            error!("STDERR: {}", stderr.trim());
        }

        Err(HardenError::ProcessError {
            command: command.to_string(),
            exit_code,
            stderr: if stderr.trim().is_empty() {
                stdout.to_string()
            } else {
                stderr.to_string()
            },
        })
    }
}

impl Default for LocalClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HostExecutor for LocalClient {
    async fn execute(&mut self, command: &str) -> Result<()> {
        debug!("Executing local command: {}", command);
        let output = Self::run(command).await?;
        Self::check_output(command, &output)
    }

    async fn execute_with_output(&mut self, command: &str) -> Result<String> {
        debug!("Executing local command with output: {}", command);
        let output = Self::run(command).await?;
        Self::check_output(command, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn check_silent(&mut self, command: &str) -> Result<bool> {
        let output = Self::run(command).await?;
        Ok(output.status.success())
    }

    async fn execute_with_stdin(&mut self, command: &str, input: &str) -> Result<()> {
        debug!("Executing local command with stdin: {}", command);

        let mut child = Command::new("bash")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HardenError::spawn(command, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        Self::check_output(command, &output)
    }

    async fn execute_interactive(&mut self, command: &str) -> Result<i32> {
        debug!("Executing interactive command: {}", command);

        let status = Command::new("bash")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| HardenError::spawn(command, e))?;

        Ok(status.code().unwrap_or(-1))
    }

    async fn read_file(&mut self, path: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&mut self, path: &str, contents: &str, mode: u32) -> Result<()> {
        debug!("Writing {} (mode {:o})", path, mode);

        if let Some(parent) = std::path::Path::new(path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // created with its final mode
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)
            .await?;
        // mode() only applies on creation
        file.set_permissions(std::fs::Permissions::from_mode(mode))
            .await?;
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn remove_file(&mut self, path: &str) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn download(&mut self, url: &str, dest: &str) -> Result<()> {
        self.downloader.download_with_progress(url, dest).await
    }

    async fn effective_uid(&mut self) -> Result<u32> {
        // SAFETY: geteuid has no preconditions and cannot fail
        Ok(unsafe { libc::geteuid() })
    }

    async fn primary_address(&mut self) -> Result<Option<String>> {
        let interfaces = NetworkInterface::show()
            .map_err(|e| HardenError::network(format!("Cannot list interfaces: {}", e)))?;

        let address = interfaces
            .iter()
            .flat_map(|iface| iface.addr.iter())
            .find_map(|addr| match addr {
                Addr::V4(v4) if !v4.ip.is_loopback() && !v4.ip.is_link_local() => {
                    Some(v4.ip.to_string())
                }
                _ => None,
            });

        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_execute_success_and_failure() {
        let mut client = LocalClient::new();

        assert!(client.execute("true").await.is_ok());

        let err = client.execute("echo boom >&2; exit 3").await.unwrap_err();
        match err {
            HardenError::ProcessError {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_execute_with_stdin() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");
        let mut client = LocalClient::new();

        client
            .execute_with_stdin(&format!("cat > '{}'", target.display()), "secret\n")
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "secret\n");
    }

    #[tokio::test]
    async fn test_write_read_remove_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("conf");
        let path = path.to_str().unwrap();
        let mut client = LocalClient::new();

        client.write_file(path, "Port 2222\n", 0o600).await.unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(
            client.read_file(path).await.unwrap().as_deref(),
            Some("Port 2222\n")
        );

        client.remove_file(path).await.unwrap();
        assert!(client.read_file(path).await.unwrap().is_none());
        // removing twice is fine
        client.remove_file(path).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_file_narrows_existing_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("90-openclaw-provision");
        std::fs::write(&path, "old contents that run longer\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        let path = path.to_str().unwrap();
        let mut client = LocalClient::new();

        client
            .write_file(path, "openclaw ALL=(ALL) NOPASSWD:ALL\n", 0o440)
            .await
            .unwrap();

        let mode = std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o440);
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "openclaw ALL=(ALL) NOPASSWD:ALL\n"
        );
    }

    #[tokio::test]
    async fn test_check_silent() {
        let mut client = LocalClient::new();
        assert!(client.check_silent("exit 0").await.unwrap());
        assert!(!client.check_silent("exit 1").await.unwrap());
    }
}
