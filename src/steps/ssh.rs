// file: src/steps/ssh.rs
// version: 1.0.0
// guid: fd885c39-3fbb-46d8-8954-728761dfdca4

//! SSH daemon relocation and hardening.
//!
//! The daemon moves through three states: `Legacy` (untouched), `Proposed`
//! (drop-in on disk, not yet validated or applied) and `Hardened` (daemon
//! restarted on the new port). A drop-in that fails `sshd -t` is removed by
//! [`SshHardeningStep::compensate`] before anything restarts, so the daemon
//! keeps serving the previous configuration.

use super::{success_result_with_metadata, ProvisionContext, ProvisionStep, StepResult};
use crate::config::SshHardeningConfig;
use crate::error::HardenError;
use crate::network::executor::shell_quote;
use crate::network::HostExecutor;
use crate::Result;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Proof that the daemon was restarted on a validated configuration.
///
/// Only this module can construct it; the firewall step demands one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardenedSsh {
    port: u16,
    drop_in_path: String,
}

impl HardenedSsh {
    /// Port the daemon now listens on
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Drop-in file holding the active directives
    pub fn drop_in_path(&self) -> &str {
        &self.drop_in_path
    }
}

/// Where the SSH daemon is in the transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshState {
    /// Original configuration, original port
    Legacy,
    /// Drop-in written but not applied
    Proposed,
    /// Validated; restart in progress
    Applying,
    /// Restarted on the new port
    Hardened(HardenedSsh),
}

impl SshState {
    pub fn hardened(&self) -> Option<&HardenedSsh> {
        match self {
            SshState::Hardened(proof) => Some(proof),
            _ => None,
        }
    }
}

/// Ordered `sshd_config` directives for the drop-in file
#[derive(Debug, Clone, PartialEq)]
pub struct SshdDropIn {
    directives: Vec<(&'static str, String)>,
}

impl SshdDropIn {
    /// Build the hardened directive set for `username` on `port`
    pub fn new(cfg: &SshHardeningConfig, username: &str, port: u16) -> Self {
        let directives = vec![
            ("Port", port.to_string()),
            ("PermitRootLogin", "no".to_string()),
            // stays on until the operator confirms key login works
            ("PasswordAuthentication", "yes".to_string()),
            ("PubkeyAuthentication", "yes".to_string()),
            ("KbdInteractiveAuthentication", "no".to_string()),
            ("PermitEmptyPasswords", "no".to_string()),
            ("AllowUsers", username.to_string()),
            ("MaxAuthTries", cfg.max_auth_tries.to_string()),
            ("LoginGraceTime", cfg.login_grace_time_secs.to_string()),
            ("X11Forwarding", "no".to_string()),
            ("ClientAliveInterval", cfg.client_alive_interval_secs.to_string()),
            ("ClientAliveCountMax", cfg.client_alive_count_max.to_string()),
            ("Banner", cfg.banner_path.clone()),
            ("Ciphers", cfg.ciphers.join(",")),
            ("MACs", cfg.macs.join(",")),
            ("KexAlgorithms", cfg.kex_algorithms.join(",")),
        ];
        Self { directives }
    }

    /// Value of a directive, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// File content, one directive per line
    pub fn render(&self) -> String {
        let mut out = String::from(
            "# Managed by ubuntu-harden-agent. Sorted first so these values win.\n",
        );
        for (key, value) in &self.directives {
            out.push_str(key);
            out.push(' ');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

/// Command that flips password authentication off in the drop-in
pub fn disable_password_auth_command(drop_in_path: &str) -> String {
    format!(
        "sudo sed -i 's/^PasswordAuthentication yes/PasswordAuthentication no/' {} && sudo systemctl restart ssh",
        drop_in_path
    )
}

/// Relocates and hardens the SSH daemon
pub struct SshHardeningStep;

impl SshHardeningStep {
    async fn backup_main_config(exec: &mut dyn HostExecutor, main_config: &str) {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let cmd = format!(
            "cp -p {0} {0}.bak.{1}",
            shell_quote(main_config),
            stamp
        );
        if let Err(e) = exec.execute(&cmd).await {
            warn!("Could not back up {}: {}", main_config, e);
        }
    }

    async fn validate(exec: &mut dyn HostExecutor) -> Result<()> {
        // sshd -t refuses to run without its privilege separation dir
        exec.execute("mkdir -p /run/sshd && chmod 0755 /run/sshd").await?;

        exec.execute("sshd -t").await.map_err(|e| match e {
            HardenError::ProcessError { stderr, .. } => {
                HardenError::SshConfigRejected(stderr.trim().to_string())
            }
            other => HardenError::SshConfigRejected(other.to_string()),
        })
    }

    async fn restart(exec: &mut dyn HostExecutor) -> Result<()> {
        // socket activation ignores Port, so hand the listener back to the service
        if exec
            .check_silent("systemctl is-active --quiet ssh.socket")
            .await?
        {
            info!("Disabling ssh.socket activation so the new port takes effect");
            exec.execute("systemctl disable --now ssh.socket").await?;
            exec.execute("systemctl enable ssh.service").await?;
        }

        exec.execute("systemctl restart ssh || systemctl restart sshd")
            .await
    }
}

#[async_trait::async_trait]
impl ProvisionStep for SshHardeningStep {
    fn name(&self) -> &str {
        "ssh-hardening"
    }

    fn description(&self) -> &str {
        "Hardening SSH daemon"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let cfg = ctx.config.ssh.clone();
        let port = ctx.params.ssh_port;

        if ctx.ssh != SshState::Legacy {
            return Err(HardenError::ordering(format!(
                "SSH hardening started from state {:?}",
                ctx.ssh
            )));
        }

        Self::backup_main_config(exec, &cfg.main_config_path).await;
        exec.write_file(&cfg.banner_path, &cfg.banner_text, 0o644)
            .await?;

        let drop_in = SshdDropIn::new(&cfg, ctx.username(), port);
        ctx.ssh = SshState::Proposed;
        exec.write_file(&cfg.drop_in_path, &drop_in.render(), 0o644)
            .await?;
        debug!("Proposed SSH drop-in written to {}", cfg.drop_in_path);

        Self::validate(exec).await?;
        info!("sshd -t accepted the proposed configuration");

        ctx.ssh = SshState::Applying;
        Self::restart(exec).await?;

        ctx.ssh = SshState::Hardened(HardenedSsh {
            port,
            drop_in_path: cfg.drop_in_path.clone(),
        });
        info!("SSH daemon now listening on port {}", port);

        let mut metadata = HashMap::new();
        metadata.insert("port".to_string(), port.to_string());
        metadata.insert("drop_in".to_string(), cfg.drop_in_path);
        Ok(success_result_with_metadata(
            format!("SSH moved to port {}", port),
            start.elapsed(),
            metadata,
        ))
    }

    async fn compensate(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<()> {
        let drop_in_path = ctx.config.ssh.drop_in_path.clone();

        match ctx.ssh {
            SshState::Proposed => {
                warn!("Discarding rejected SSH drop-in {}", drop_in_path);
                exec.remove_file(&drop_in_path).await?;
                ctx.ssh = SshState::Legacy;
            }
            SshState::Applying => {
                warn!(
                    "SSH restart failed; removing {} and restarting on the previous configuration",
                    drop_in_path
                );
                exec.remove_file(&drop_in_path).await?;
                if let Err(e) = exec
                    .execute("systemctl restart ssh || systemctl restart sshd")
                    .await
                {
                    warn!("Restart on previous configuration failed: {}", e);
                }
                ctx.ssh = SshState::Legacy;
            }
            SshState::Legacy | SshState::Hardened(_) => {}
        }

        Ok(())
    }
}
