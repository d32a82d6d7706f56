// file: src/steps/app_install.rs
// version: 1.1.0
// guid: cf306163-397c-42d2-8e55-bca0e4e27d8e

//! Third-party application install under a temporary sudo grant.
//!
//! The grant exists only while the installer runs and is removed whatever
//! the installer's outcome. Installer failure is recorded, not fatal.

use super::{
    degraded_result, skipped_result, success_result, InstallerOutcome, ProvisionContext,
    ProvisionStep, StepResult,
};
use crate::error::HardenError;
use crate::network::download::verify_sha256;
use crate::network::executor::shell_quote;
use crate::network::HostExecutor;
use crate::Result;
use std::time::Instant;
use tracing::{info, warn};

/// Sudoers drop-in granting passwordless elevation to `username`
pub fn grant_path(username: &str) -> String {
    format!("/etc/sudoers.d/90-{}-provision", username)
}

pub struct AppInstallStep;

impl AppInstallStep {
    async fn grant(exec: &mut dyn HostExecutor, username: &str) -> Result<()> {
        let path = grant_path(username);
        exec.write_file(&path, &format!("{} ALL=(ALL) NOPASSWD:ALL\n", username), 0o440)
            .await?;

        // a broken sudoers drop-in disables sudo for everyone
        if let Err(e) = exec.execute(&format!("visudo -cf {}", shell_quote(&path))).await {
            exec.remove_file(&path).await?;
            return Err(e);
        }
        Ok(())
    }

    async fn revoke(exec: &mut dyn HostExecutor, username: &str) -> Result<()> {
        exec.remove_file(&grant_path(username)).await?;
        info!("Revoked temporary passwordless sudo for {}", username);
        Ok(())
    }

    /// Download, verify and run the installer; returns its exit code
    async fn fetch_and_run(ctx: &ProvisionContext, exec: &mut dyn HostExecutor) -> Result<i32> {
        let app = &ctx.config.app;
        let script = app.script_path.as_str();

        exec.download(&app.installer_url, script).await?;

        if let Some(pin) = &app.installer_sha256 {
            let body = exec.read_file(script).await?.ok_or_else(|| {
                HardenError::network(format!("downloaded installer missing at {}", script))
            })?;
            verify_sha256(body.as_bytes(), pin)?;
        }

        exec.execute(&format!("chmod 755 {}", shell_quote(script)))
            .await?;

        // run from a file rather than a pipe so the installer can prompt on the terminal
        let command = format!(
            "cd {home} && sudo -u {user} -H env PATH={path} bash {script}",
            home = shell_quote(&ctx.home_dir),
            user = shell_quote(ctx.username()),
            path = format!(
                "\"{}/{}:$PATH\"",
                ctx.home_dir,
                app.local_bin_dir.trim_matches('/')
            ),
            script = shell_quote(script),
        );
        exec.execute_interactive(&command).await
    }
}

#[async_trait::async_trait]
impl ProvisionStep for AppInstallStep {
    fn name(&self) -> &str {
        "app-install"
    }

    fn description(&self) -> &str {
        "Installing application"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();

        if !ctx.options.install_app {
            ctx.installer = InstallerOutcome::Skipped;
            return Ok(skipped_result("application install disabled"));
        }

        let username = ctx.username().to_string();
        Self::grant(exec, &username).await?;
        let outcome = Self::fetch_and_run(ctx, exec).await;
        Self::revoke(exec, &username).await?;

        if let Err(e) = exec.remove_file(&ctx.config.app.script_path).await {
            warn!("Could not remove installer script: {}", e);
        }

        ctx.installer = match outcome {
            Ok(0) => InstallerOutcome::Succeeded,
            Ok(code) => InstallerOutcome::Failed(format!("installer exited with status {}", code)),
            Err(e) => InstallerOutcome::Failed(e.to_string()),
        };

        match &ctx.installer {
            InstallerOutcome::Failed(reason) => {
                warn!("Application install failed ({}); hardening is unaffected", reason);
                Ok(degraded_result(
                    format!("Application install failed: {}", reason),
                    start.elapsed(),
                ))
            }
            _ => Ok(success_result("Application installed", start.elapsed())),
        }
    }

    async fn compensate(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<()> {
        let username = ctx.username().to_string();
        Self::revoke(exec, &username).await?;
        if let Err(e) = exec.remove_file(&ctx.config.app.script_path).await {
            warn!("Could not remove installer script: {}", e);
        }
        Ok(())
    }
}
