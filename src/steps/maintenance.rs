// file: src/steps/maintenance.rs
// version: 1.0.0
// guid: ac4f0d5d-d0d5-49ac-9c72-b6eb5a35d757

//! Unattended security upgrades and time synchronization

use super::{success_result, ProvisionContext, ProvisionStep, StepResult};
use crate::network::HostExecutor;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

pub const AUTO_UPGRADES_PATH: &str = "/etc/apt/apt.conf.d/20auto-upgrades";

pub const AUTO_UPGRADES: &str = r#"APT::Periodic::Update-Package-Lists "1";
APT::Periodic::Unattended-Upgrade "1";
APT::Periodic::AutocleanInterval "7";
"#;

pub struct MaintenanceStep;

#[async_trait::async_trait]
impl ProvisionStep for MaintenanceStep {
    fn name(&self) -> &str {
        "maintenance"
    }

    fn description(&self) -> &str {
        "Enabling automatic security updates"
    }

    async fn execute(
        &self,
        _ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();

        exec.write_file(AUTO_UPGRADES_PATH, AUTO_UPGRADES, 0o644)
            .await?;
        exec.execute("systemctl enable --now unattended-upgrades")
            .await?;
        info!("Unattended security upgrades enabled");

        // containers and some hypervisors refuse NTP changes
        if let Err(e) = exec.execute("timedatectl set-ntp true").await {
            warn!("Could not enable NTP synchronization: {}", e);
        }

        Ok(success_result(
            "Security updates and time sync enabled",
            start.elapsed(),
        ))
    }
}
