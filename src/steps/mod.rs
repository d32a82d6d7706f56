// file: src/steps/mod.rs
// version: 2.0.0
// guid: dfaa222e-9d2f-458a-b626-ba90f1853fe1

//! Provisioning steps and the state they share

pub mod app_install;
pub mod firewall;
pub mod interrupt;
pub mod maintenance;
pub mod report;
pub mod runner;
pub mod ssh;
pub mod swap;
pub mod system_update;
pub mod user;

pub use interrupt::Interrupt;
pub use runner::StepRunner;
pub use ssh::{HardenedSsh, SshState};

use crate::config::ProvisionConfig;
use crate::network::HostExecutor;
use crate::reporter::ProvisionReport;
use crate::security::{Credential, InvocationParams};
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Switches chosen on the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub reboot: bool,
    pub install_app: bool,
    pub json: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            reboot: true,
            install_app: true,
            json: false,
        }
    }
}

/// What happened to the third-party installer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum InstallerOutcome {
    NotRun,
    Skipped,
    Succeeded,
    Failed(String),
}

/// State threaded through every step of a run
#[derive(Debug)]
pub struct ProvisionContext {
    /// Current provisioning session ID
    pub run_id: Uuid,
    pub config: ProvisionConfig,
    pub params: InvocationParams,
    pub options: RunOptions,
    /// Present only until the account has been created
    pub credential: Option<Credential>,
    /// Home directory of the administrative account
    pub home_dir: String,
    pub user_created: bool,
    /// The account has non-empty authorized_keys
    pub keys_present: bool,
    pub ssh: SshState,
    pub installer: InstallerOutcome,
    pub reboot_scheduled: bool,
    pub report: Option<ProvisionReport>,
}

impl ProvisionContext {
    pub fn new(
        config: ProvisionConfig,
        params: InvocationParams,
        options: RunOptions,
        credential: Option<Credential>,
    ) -> Self {
        let home_dir = format!("/home/{}", params.username);
        Self {
            run_id: Uuid::new_v4(),
            config,
            params,
            options,
            credential,
            home_dir,
            user_created: false,
            keys_present: false,
            ssh: SshState::Legacy,
            installer: InstallerOutcome::NotRun,
            reboot_scheduled: false,
            report: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.params.username
    }
}

/// Result of executing a provisioning step
#[derive(Debug, Clone)]
pub struct StepResult {
    pub status: StepStatus,
    /// Human-readable message describing the result
    pub message: String,
    /// Time taken to execute the step
    pub execution_time: Duration,
    pub metadata: HashMap<String, String>,
}

/// Status of a finished step
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// Step completed successfully
    Completed,

    /// Nothing to do (e.g. swap already active)
    Skipped,

    /// Step failed in a way the run tolerates
    Degraded,
}

/// Trait for provisioning steps
#[async_trait::async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Short identifier used in spans and logs
    fn name(&self) -> &str;

    /// Progress line shown to the operator
    fn description(&self) -> &str;

    /// Execute the step
    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult>;

    /// Undo partial work after `execute` failed
    async fn compensate(
        &self,
        _ctx: &mut ProvisionContext,
        _exec: &mut dyn HostExecutor,
    ) -> Result<()> {
        Ok(())
    }
}

/// Helper for creating successful step results
pub fn success_result(message: impl Into<String>, execution_time: Duration) -> StepResult {
    StepResult {
        status: StepStatus::Completed,
        message: message.into(),
        execution_time,
        metadata: HashMap::new(),
    }
}

/// Helper for creating successful step results with metadata
pub fn success_result_with_metadata(
    message: impl Into<String>,
    execution_time: Duration,
    metadata: HashMap<String, String>,
) -> StepResult {
    StepResult {
        status: StepStatus::Completed,
        message: message.into(),
        execution_time,
        metadata,
    }
}

/// Helper for creating skipped step results
pub fn skipped_result(reason: impl Into<String>) -> StepResult {
    StepResult {
        status: StepStatus::Skipped,
        message: format!("Step skipped: {}", reason.into()),
        execution_time: Duration::from_secs(0),
        metadata: HashMap::new(),
    }
}

/// Helper for tolerated failures
pub fn degraded_result(message: impl Into<String>, execution_time: Duration) -> StepResult {
    StepResult {
        status: StepStatus::Degraded,
        message: message.into(),
        execution_time,
        metadata: HashMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_result_helpers() {
        let ok = success_result("done", Duration::from_secs(1));
        assert_eq!(ok.status, StepStatus::Completed);
        assert_eq!(ok.message, "done");

        let skipped = skipped_result("swap already active");
        assert_eq!(skipped.status, StepStatus::Skipped);
        assert!(skipped.message.contains("swap already active"));

        let degraded = degraded_result("installer failed", Duration::from_secs(2));
        assert_eq!(degraded.status, StepStatus::Degraded);
    }

    #[test]
    fn test_context_starts_legacy() {
        let params = InvocationParams {
            username: "admin".to_string(),
            ssh_port: 8888,
        };
        let ctx = ProvisionContext::new(
            ProvisionConfig::default(),
            params,
            RunOptions::default(),
            None,
        );

        assert_eq!(ctx.home_dir, "/home/admin");
        assert!(matches!(ctx.ssh, SshState::Legacy));
        assert_eq!(ctx.installer, InstallerOutcome::NotRun);
    }

    #[test]
    fn test_installer_outcome_serialization() {
        let json = serde_json::to_string(&InstallerOutcome::Failed("exit 2".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","detail":"exit 2"}"#);
    }
}
