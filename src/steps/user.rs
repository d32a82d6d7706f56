// file: src/steps/user.rs
// version: 1.0.0
// guid: 7510a5c9-eee1-4992-8e10-0847032d3bd7

//! Administrative account creation

use super::{success_result_with_metadata, ProvisionContext, ProvisionStep, StepResult};
use crate::error::HardenError;
use crate::network::executor::{ensure_line, file_has_content, shell_quote};
use crate::network::HostExecutor;
use crate::security::Credential;
use crate::Result;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

pub const ROOT_AUTHORIZED_KEYS: &str = "/root/.ssh/authorized_keys";

/// Group that grants sudo on Debian and Ubuntu
pub const ADMIN_GROUP: &str = "sudo";

/// Whether `username` already exists
pub async fn user_exists(exec: &mut dyn HostExecutor, username: &str) -> Result<bool> {
    exec.check_silent(&format!("id -u {} >/dev/null 2>&1", shell_quote(username)))
        .await
}

/// Home directory from the passwd database, `/home/<user>` when unknown
pub async fn home_dir(exec: &mut dyn HostExecutor, username: &str) -> String {
    let cmd = format!("getent passwd {} | cut -d: -f6", shell_quote(username));
    match exec.execute_with_output(&cmd).await {
        Ok(out) if out.trim().starts_with('/') => out.trim().to_string(),
        _ => format!("/home/{}", username),
    }
}

/// `.bashrc` line putting the package-manager-local bin dir on PATH
pub fn path_export_line(local_bin_dir: &str) -> String {
    format!("export PATH=\"$HOME/{}:$PATH\"", local_bin_dir.trim_matches('/'))
}

pub struct UserStep;

impl UserStep {
    async fn create(ctx: &mut ProvisionContext, exec: &mut dyn HostExecutor) -> Result<()> {
        let username = ctx.username().to_string();
        let credential = ctx.credential.take().ok_or_else(|| {
            HardenError::credential(format!("no password collected for new account {}", username))
        })?;

        exec.execute(&format!("useradd -m -s /bin/bash {}", shell_quote(&username)))
            .await?;
        let line = Credential::new(format!("{}:{}\n", username, credential.expose()));
        exec.execute_with_stdin("chpasswd", line.expose()).await?;
        drop(line);
        drop(credential);

        ctx.user_created = true;
        info!("Created account {}", username);
        Ok(())
    }

    /// Copy root's keys so the account is reachable without the password
    async fn copy_root_keys(ctx: &ProvisionContext, exec: &mut dyn HostExecutor) -> Result<bool> {
        let keys = match exec.read_file(ROOT_AUTHORIZED_KEYS).await? {
            Some(keys) if !keys.trim().is_empty() => keys,
            _ => {
                debug!("No root authorized_keys to copy");
                return Ok(false);
            }
        };

        let ssh_dir = format!("{}/.ssh", ctx.home_dir);
        let owner = shell_quote(&format!("{0}:{0}", ctx.username()));
        exec.write_file(&format!("{}/authorized_keys", ssh_dir), &keys, 0o600)
            .await?;
        exec.execute(&format!(
            "chmod 700 {dir} && chown -R {owner} {dir}",
            dir = shell_quote(&ssh_dir),
            owner = owner
        ))
        .await?;

        info!("Copied root's authorized keys to {}", ctx.username());
        Ok(true)
    }
}

#[async_trait::async_trait]
impl ProvisionStep for UserStep {
    fn name(&self) -> &str {
        "user"
    }

    fn description(&self) -> &str {
        "Creating administrative user"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let username = ctx.username().to_string();

        if user_exists(exec, &username).await? {
            info!("Account {} already exists; keeping its password", username);
            ctx.credential = None;
            ctx.home_dir = home_dir(exec, &username).await;
            ctx.keys_present =
                file_has_content(exec, &format!("{}/.ssh/authorized_keys", ctx.home_dir)).await?;
        } else {
            Self::create(ctx, exec).await?;
            ctx.home_dir = home_dir(exec, &username).await;
            ctx.keys_present = Self::copy_root_keys(ctx, exec).await?;
        }

        exec.execute(&format!(
            "usermod -aG {} {}",
            ADMIN_GROUP,
            shell_quote(&username)
        ))
        .await?;

        let bashrc = format!("{}/.bashrc", ctx.home_dir);
        let line = path_export_line(&ctx.config.app.local_bin_dir);
        if ensure_line(exec, &bashrc, &line, 0o644).await? {
            exec.execute(&format!(
                "chown {} {}",
                shell_quote(&format!("{0}:{0}", username)),
                shell_quote(&bashrc)
            ))
            .await?;
        }

        let mut metadata = HashMap::new();
        metadata.insert("created".to_string(), ctx.user_created.to_string());
        metadata.insert("keys_present".to_string(), ctx.keys_present.to_string());
        Ok(success_result_with_metadata(
            format!("Account {} ready", username),
            start.elapsed(),
            metadata,
        ))
    }
}
