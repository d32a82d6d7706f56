// file: src/steps/runner.rs
// version: 1.1.0
// guid: 2d92c6f0-c62e-48e1-a77d-98001b40214d

//! Ordered step execution with compensation on failure

use super::app_install::AppInstallStep;
use super::firewall::FirewallStep;
use super::maintenance::MaintenanceStep;
use super::report::ReportStep;
use super::ssh::SshHardeningStep;
use super::swap::SwapStep;
use super::system_update::SystemUpdateStep;
use super::user::UserStep;
use super::{Interrupt, ProvisionContext, ProvisionStep, StepResult, StepStatus};
use crate::logging::logger::with_async_operation_span;
use crate::network::HostExecutor;
use crate::error::HardenError;
use crate::reporter::{print_warning, Progress};
use crate::Result;
use tracing::{debug, error, info, warn};

/// Runs steps in order and stops at the first failure
pub struct StepRunner {
    steps: Vec<Box<dyn ProvisionStep>>,
}

impl StepRunner {
    pub fn new(steps: Vec<Box<dyn ProvisionStep>>) -> Self {
        Self { steps }
    }

    /// The full mutation sequence. Firewall follows SSH hardening.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(SystemUpdateStep),
            Box::new(SwapStep),
            Box::new(UserStep),
            Box::new(SshHardeningStep),
            Box::new(FirewallStep),
            Box::new(MaintenanceStep),
            Box::new(AppInstallStep),
            Box::new(ReportStep),
        ])
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute every step; on failure or interrupt run that step's
    /// compensation and return the error
    pub async fn run(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
        progress: &mut Progress,
        interrupt: &Interrupt,
    ) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            if interrupt.is_triggered() {
                return Err(HardenError::Interrupted(format!(
                    "stopped before {}",
                    step.name()
                )));
            }

            let stage = progress.announce(step.description());
            debug!("Stage {} ({}) starting", stage, step.name());

            let outcome = {
                let (step_ctx, step_exec) = (&mut *ctx, &mut *exec);
                let execution =
                    with_async_operation_span(step.name(), move || step.execute(step_ctx, step_exec));
                // the step future is dropped here on interrupt, before compensation
                tokio::select! {
                    result = execution => Some(result),
                    _ = interrupt.triggered() => None,
                }
            };

            let failure = match outcome {
                Some(Ok(result)) => {
                    match result.status {
                        StepStatus::Degraded => print_warning(&result.message),
                        _ => info!("{} ({:.1?})", result.message, result.execution_time),
                    }
                    results.push(result);
                    continue;
                }
                Some(Err(e)) => {
                    error!("Step {} failed: {}", step.name(), e);
                    e
                }
                None => {
                    warn!("Step {} interrupted", step.name());
                    HardenError::Interrupted(format!("interrupted during {}", step.name()))
                }
            };

            if let Err(ce) = step.compensate(ctx, exec).await {
                error!("Compensation for {} failed: {}", step.name(), ce);
            }
            return Err(failure);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let runner = StepRunner::standard();
        let names = runner.step_names();

        let ssh = names.iter().position(|n| *n == "ssh-hardening").unwrap();
        let firewall = names.iter().position(|n| *n == "firewall").unwrap();
        let user = names.iter().position(|n| *n == "user").unwrap();

        assert!(user < ssh, "AllowUsers needs the account to exist");
        assert!(ssh < firewall, "firewall must follow the SSH move");
        assert_eq!(names.last(), Some(&"report"));
        assert_eq!(runner.len(), 8);
    }
}
