// file: src/steps/report.rs
// version: 1.0.0
// guid: cc3baab8-94e7-4dc1-b530-3705388ec300

//! Final report and scheduled reboot

use super::ssh::disable_password_auth_command;
use super::{success_result, ProvisionContext, ProvisionStep, StepResult};
use crate::error::HardenError;
use crate::network::HostExecutor;
use crate::reporter::ProvisionReport;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

/// Builds the report and schedules the reboot
pub struct ReportStep;

impl ReportStep {
    pub fn reboot_command(delay_minutes: u32) -> String {
        format!(
            "shutdown -r +{} \"ubuntu-harden-agent: provisioning complete\"",
            delay_minutes
        )
    }
}

#[async_trait::async_trait]
impl ProvisionStep for ReportStep {
    fn name(&self) -> &str {
        "report"
    }

    fn description(&self) -> &str {
        "Reporting and scheduling reboot"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let ssh = ctx.ssh.hardened().cloned().ok_or_else(|| {
            HardenError::ordering("report requested before SSH was hardened")
        })?;

        let address = match exec.primary_address().await {
            Ok(address) => address,
            Err(e) => {
                warn!("Could not detect host address: {}", e);
                None
            }
        };

        let delay = ctx.config.reboot_delay_minutes;
        if ctx.options.reboot {
            exec.execute(&Self::reboot_command(delay)).await?;
            ctx.reboot_scheduled = true;
            info!("Reboot scheduled in {} minute(s)", delay);
        } else {
            info!("Reboot skipped by request");
        }

        let report = ProvisionReport {
            run_id: ctx.run_id,
            username: ctx.username().to_string(),
            ssh_port: ssh.port(),
            address,
            keys_present: ctx.keys_present,
            password_auth_enabled: true,
            disable_password_command: ctx
                .keys_present
                .then(|| disable_password_auth_command(ssh.drop_in_path())),
            installer: ctx.installer.clone(),
            reboot_scheduled: ctx.reboot_scheduled,
            reboot_delay_minutes: delay,
            finished_at: chrono::Utc::now(),
        };
        ctx.report = Some(report);

        Ok(success_result("Report ready", start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reboot_command() {
        assert!(ReportStep::reboot_command(1).starts_with("shutdown -r +1 "));
    }
}
