// file: src/network/dry_run.rs
// version: 1.1.0
// guid: bc5d3dd8-1059-4878-904b-cbfc8c307da1

//! Executor that inspects the real host but only logs mutations

use super::executor::HostExecutor;
use super::local::LocalClient;
use crate::error::HardenError;
use crate::Result;
use tracing::{info, warn};

/// Reads and status checks hit the host; anything that would change it is logged
pub struct DryRunClient {
    inner: LocalClient,
}

impl DryRunClient {
    /// Create a dry-run client over the local host
    pub fn new() -> Self {
        Self {
            inner: LocalClient::new(),
        }
    }
}

impl Default for DryRunClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl HostExecutor for DryRunClient {
    async fn execute(&mut self, command: &str) -> Result<()> {
        info!("DRY RUN: would execute: {}", command);
        Ok(())
    }

    // only status checks go through here
    async fn execute_with_output(&mut self, command: &str) -> Result<String> {
        self.inner.execute_with_output(command).await
    }

    async fn check_silent(&mut self, command: &str) -> Result<bool> {
        self.inner.check_silent(command).await
    }

    async fn execute_with_stdin(&mut self, command: &str, _input: &str) -> Result<()> {
        info!("DRY RUN: would execute with stdin: {}", command);
        Ok(())
    }

    async fn execute_interactive(&mut self, command: &str) -> Result<i32> {
        info!("DRY RUN: would run interactively: {}", command);
        Ok(0)
    }

    async fn read_file(&mut self, path: &str) -> Result<Option<String>> {
        // dry runs may be unprivileged; treat unreadable files as absent
        match self.inner.read_file(path).await {
            Err(HardenError::Io(e)) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                warn!("DRY RUN: cannot read {} without root; assuming absent", path);
                Ok(None)
            }
            other => other,
        }
    }

    async fn write_file(&mut self, path: &str, contents: &str, mode: u32) -> Result<()> {
        info!(
            "DRY RUN: would write {} (mode {:o}, {} bytes)",
            path,
            mode,
            contents.len()
        );
        Ok(())
    }

    async fn remove_file(&mut self, path: &str) -> Result<()> {
        info!("DRY RUN: would remove {}", path);
        Ok(())
    }

    async fn download(&mut self, url: &str, dest: &str) -> Result<()> {
        info!("DRY RUN: would download {} to {}", url, dest);
        Ok(())
    }

    async fn effective_uid(&mut self) -> Result<u32> {
        self.inner.effective_uid().await
    }

    async fn primary_address(&mut self) -> Result<Option<String>> {
        self.inner.primary_address().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf");
        let path = path.to_str().unwrap();
        let mut client = DryRunClient::new();

        client.write_file(path, "x", 0o644).await.unwrap();
        client.execute(&format!("touch '{}'", path)).await.unwrap();

        assert!(client.read_file(path).await.unwrap().is_none());
    }
}
