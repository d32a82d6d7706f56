// file: src/steps/swap.rs
// version: 1.0.0
// guid: c175c09d-48cd-480a-9968-376ee1326d10

//! Ensures at least one active swap area

use super::{skipped_result, success_result, ProvisionContext, ProvisionStep, StepResult};
use crate::network::executor::{ensure_line, shell_quote};
use crate::network::HostExecutor;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

pub const FSTAB_PATH: &str = "/etc/fstab";

pub struct SwapStep;

impl SwapStep {
    /// `/etc/fstab` entry for the swapfile
    pub fn fstab_entry(path: &str) -> String {
        format!("{} none swap sw 0 0", path)
    }

    async fn create_swapfile(exec: &mut dyn HostExecutor, path: &str, size_mb: u64) -> Result<()> {
        let quoted = shell_quote(path);
        // fallocate is unsupported on some filesystems
        exec.execute(&format!(
            "fallocate -l {size}M {p} || dd if=/dev/zero of={p} bs=1M count={size} status=none",
            size = size_mb,
            p = quoted
        ))
        .await?;
        exec.execute(&format!("chmod 600 {}", quoted)).await?;
        exec.execute(&format!("mkswap {}", quoted)).await?;
        exec.execute(&format!("swapon {}", quoted)).await
    }
}

#[async_trait::async_trait]
impl ProvisionStep for SwapStep {
    fn name(&self) -> &str {
        "swap"
    }

    fn description(&self) -> &str {
        "Provisioning swap"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let path = ctx.config.swap.path.clone();
        let size_mb = ctx.config.swap.size_mb;

        let active = exec.execute_with_output("swapon --show --noheadings").await?;
        if !active.trim().is_empty() {
            info!("Swap already active, leaving it alone");
            return Ok(skipped_result("swap already active"));
        }

        let quoted = shell_quote(&path);
        let reused = if exec.check_silent(&format!("test -f {}", quoted)).await? {
            match exec.execute(&format!("swapon {}", quoted)).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Existing {} could not be activated: {}", path, e);
                    false
                }
            }
        } else {
            false
        };

        if !reused {
            warn!("No active swap; creating {} MiB at {}", size_mb, path);
            exec.execute(&format!("rm -f {}", quoted)).await?;
            Self::create_swapfile(exec, &path, size_mb).await?;
        }

        ensure_line(exec, FSTAB_PATH, &Self::fstab_entry(&path), 0o644).await?;

        Ok(success_result(
            format!("Swap active at {}", path),
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fstab_entry() {
        assert_eq!(SwapStep::fstab_entry("/swapfile"), "/swapfile none swap sw 0 0");
    }
}
