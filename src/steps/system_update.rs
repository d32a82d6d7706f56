// file: src/steps/system_update.rs
// version: 1.0.0
// guid: 53fb9697-8f5d-471e-8e3b-2a8140dbadda

//! Non-interactive package upgrade and install

use super::{success_result, ProvisionContext, ProvisionStep, StepResult};
use crate::network::executor::shell_quote;
use crate::network::HostExecutor;
use crate::Result;
use std::time::Instant;
use tracing::info;

const APT: &str = "DEBIAN_FRONTEND=noninteractive apt-get -y -q";

/// Keep existing config files when packages ship new ones
const KEEP_CONFIGS: &str = "-o Dpkg::Options::=--force-confdef -o Dpkg::Options::=--force-confold";

pub struct SystemUpdateStep;

impl SystemUpdateStep {
    pub fn commands(packages: &[String]) -> Vec<String> {
        let mut cmds = vec![
            format!("{} update", APT),
            format!("{} {} upgrade", APT, KEEP_CONFIGS),
        ];

        if !packages.is_empty() {
            let quoted: Vec<String> = packages.iter().map(|p| shell_quote(p)).collect();
            cmds.push(format!(
                "{} {} install --no-install-recommends {}",
                APT,
                KEEP_CONFIGS,
                quoted.join(" ")
            ));
        }

        cmds
    }
}

#[async_trait::async_trait]
impl ProvisionStep for SystemUpdateStep {
    fn name(&self) -> &str {
        "system-update"
    }

    fn description(&self) -> &str {
        "Updating system packages"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();

        for cmd in Self::commands(&ctx.config.packages) {
            exec.execute(&cmd).await?;
        }

        info!("Installed {} packages", ctx.config.packages.len());
        Ok(success_result("System packages up to date", start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_noninteractive() {
        let cmds = SystemUpdateStep::commands(&["ufw".to_string(), "fail2ban".to_string()]);

        assert_eq!(cmds.len(), 3);
        assert!(cmds.iter().all(|c| c.starts_with("DEBIAN_FRONTEND=noninteractive")));
        assert!(cmds[1].contains("--force-confold"));
        assert!(cmds[2].ends_with("'ufw' 'fail2ban'"));
    }

    #[test]
    fn test_no_install_without_packages() {
        let cmds = SystemUpdateStep::commands(&[]);
        assert_eq!(cmds.len(), 2);
    }
}
