// file: src/steps/firewall.rs
// version: 1.0.0
// guid: 931218df-f23d-448c-8434-500268f1a39b

//! UFW policy and fail2ban jail for the relocated SSH port

use super::ssh::HardenedSsh;
use super::{success_result_with_metadata, ProvisionContext, ProvisionStep, StepResult};
use crate::config::BanConfig;
use crate::error::HardenError;
use crate::network::executor::shell_quote;
use crate::network::HostExecutor;
use crate::Result;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Default-deny inbound policy with one rate-limited SSH rule
#[derive(Debug, Clone, PartialEq)]
pub struct FirewallPolicy {
    pub default_incoming: String,
    pub default_outgoing: String,
    pub limited_port: u16,
}

impl FirewallPolicy {
    /// Policy for a daemon that has already moved; the proof makes
    /// enabling the firewall before the move unrepresentable
    pub fn for_hardened(ssh: &HardenedSsh) -> Self {
        Self {
            default_incoming: "deny".into(),
            default_outgoing: "allow".into(),
            limited_port: ssh.port(),
        }
    }

    /// ufw commands in application order; enable comes last
    pub fn commands(&self) -> Vec<String> {
        vec![
            format!("ufw default {} incoming", self.default_incoming),
            format!("ufw default {} outgoing", self.default_outgoing),
            format!("ufw limit {}/tcp comment 'SSH'", self.limited_port),
            "ufw --force enable".to_string(),
        ]
    }
}

/// Where fail2ban reads sshd failures from
#[derive(Debug, Clone, PartialEq)]
pub enum LogSource {
    File(String),
    Journal,
}

/// `[sshd]` jail pointed at the new port
#[derive(Debug, Clone, PartialEq)]
pub struct JailConfig {
    pub port: u16,
    pub log_source: LogSource,
    pub max_retry: u32,
    pub find_time_secs: u64,
    pub ban_time_secs: u64,
}

impl JailConfig {
    pub fn new(ssh: &HardenedSsh, ban: &BanConfig, log_source: LogSource) -> Self {
        Self {
            port: ssh.port(),
            log_source,
            max_retry: ban.max_retry,
            find_time_secs: ban.find_time_secs,
            ban_time_secs: ban.ban_time_secs,
        }
    }

    pub fn render(&self) -> String {
        let source = match &self.log_source {
            LogSource::File(path) => format!("logpath = {}\nbackend = auto\n", path),
            LogSource::Journal => "backend = systemd\n".to_string(),
        };

        format!(
            "# Managed by ubuntu-harden-agent\n\
             [DEFAULT]\n\
             bantime = {ban}\n\
             findtime = {find}\n\
             maxretry = {retry}\n\
             \n\
             [sshd]\n\
             enabled = true\n\
             port = {port}\n\
             filter = sshd\n\
             {source}",
            ban = self.ban_time_secs,
            find = self.find_time_secs,
            retry = self.max_retry,
            port = self.port,
            source = source,
        )
    }
}

/// Enables the firewall and ban daemon, strictly after SSH has moved
pub struct FirewallStep;

impl FirewallStep {
    async fn detect_log_source(exec: &mut dyn HostExecutor, ban: &BanConfig) -> Result<LogSource> {
        let cmd = format!("test -f {}", shell_quote(&ban.auth_log_path));
        if exec.check_silent(&cmd).await? {
            Ok(LogSource::File(ban.auth_log_path.clone()))
        } else {
            Ok(LogSource::Journal)
        }
    }

    /// Apply the firewall policy; requires the hardened-SSH proof
    pub async fn apply_firewall(exec: &mut dyn HostExecutor, ssh: &HardenedSsh) -> Result<()> {
        for cmd in FirewallPolicy::for_hardened(ssh).commands() {
            exec.execute(&cmd).await?;
        }
        info!("Firewall active: inbound denied except rate-limited {}/tcp", ssh.port());
        Ok(())
    }

    /// Point fail2ban at the new port and restart it
    pub async fn apply_jail(
        exec: &mut dyn HostExecutor,
        ssh: &HardenedSsh,
        ban: &BanConfig,
    ) -> Result<LogSource> {
        let source = Self::detect_log_source(exec, ban).await?;
        let jail = JailConfig::new(ssh, ban, source.clone());

        exec.write_file(&ban.jail_path, &jail.render(), 0o644).await?;
        exec.execute("systemctl enable fail2ban").await?;
        exec.execute("systemctl restart fail2ban").await?;

        info!("fail2ban watching sshd on port {}", ssh.port());
        Ok(source)
    }
}

#[async_trait::async_trait]
impl ProvisionStep for FirewallStep {
    fn name(&self) -> &str {
        "firewall"
    }

    fn description(&self) -> &str {
        "Configuring firewall and fail2ban"
    }

    async fn execute(
        &self,
        ctx: &mut ProvisionContext,
        exec: &mut dyn HostExecutor,
    ) -> Result<StepResult> {
        let start = Instant::now();
        let ssh = ctx.ssh.hardened().cloned().ok_or_else(|| {
            HardenError::ordering(
                "firewall cannot be enabled before SSH listens on the new port",
            )
        })?;

        Self::apply_firewall(exec, &ssh).await?;
        let source = Self::apply_jail(exec, &ssh, &ctx.config.fail2ban).await?;

        let mut metadata = HashMap::new();
        metadata.insert("port".to_string(), ssh.port().to_string());
        metadata.insert("log_source".to_string(), format!("{:?}", source));
        Ok(success_result_with_metadata(
            format!("Firewall allows only {}/tcp (rate limited)", ssh.port()),
            start.elapsed(),
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jail(source: LogSource) -> JailConfig {
        JailConfig {
            port: 2222,
            log_source: source,
            max_retry: 5,
            find_time_secs: 600,
            ban_time_secs: 3600,
        }
    }

    #[test]
    fn test_jail_render_with_log_file() {
        let rendered = jail(LogSource::File("/var/log/auth.log".into())).render();

        assert!(rendered.contains("[sshd]\nenabled = true\nport = 2222\n"));
        assert!(rendered.contains("logpath = /var/log/auth.log"));
        assert!(rendered.contains("maxretry = 5"));
        assert!(rendered.contains("findtime = 600"));
        assert!(rendered.contains("bantime = 3600"));
        assert!(!rendered.contains("backend = systemd"));
    }

    #[test]
    fn test_jail_render_with_journal() {
        let rendered = jail(LogSource::Journal).render();
        assert!(rendered.contains("backend = systemd"));
        assert!(!rendered.contains("logpath"));
    }

    #[test]
    fn test_jail_never_mentions_stock_port() {
        let rendered = jail(LogSource::Journal).render();
        assert!(!rendered.contains("port = ssh"));
        assert!(!rendered.contains("port = 22\n"));
    }
}
