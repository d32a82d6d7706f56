// file: src/config/mod.rs
// version: 2.0.0
// guid: 40f6ffab-4932-4eb1-a5aa-ce9796042b9f

//! Configuration module for the hardening agent
//!
//! Every tunable of a provisioning run lives here. Defaults reproduce the
//! stock behavior, so a run with no config file needs no edits.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Account created when `-u` is not given
pub const DEFAULT_USERNAME: &str = "openclaw";

/// SSH port used when `-p` is not given
pub const DEFAULT_SSH_PORT: u16 = 2222;

/// Port the stock SSH daemon listens on
pub const STOCK_SSH_PORT: u16 = 22;

/// Port the installed application serves on
pub const APP_PORT: u16 = 18789;

/// Top-level provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Account name used when none is passed on the command line
    #[validate(length(min = 1, max = 32))]
    pub default_username: String,
    /// SSH port used when none is passed on the command line
    #[validate(range(min = 1))]
    pub default_ssh_port: u16,
    /// Ports that may never be chosen for SSH
    pub reserved_ports: Vec<u16>,
    /// Seconds to wait after warning that port 22 was kept
    #[validate(range(max = 300))]
    pub stock_port_delay_secs: u64,
    /// Packages installed after the system upgrade
    pub packages: Vec<String>,
    #[validate(nested)]
    pub swap: SwapConfig,
    #[validate(nested)]
    pub ssh: SshHardeningConfig,
    #[validate(nested)]
    pub fail2ban: BanConfig,
    #[validate(nested)]
    pub app: AppConfig,
    /// Minutes until the scheduled reboot
    #[validate(range(min = 0, max = 60))]
    pub reboot_delay_minutes: u32,
    /// File mirroring the run log; `None` disables the transcript
    pub transcript_path: Option<PathBuf>,
}

/// Swapfile provisioning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SwapConfig {
    #[validate(length(min = 2))]
    pub path: String,
    #[validate(range(min = 256, max = 65536))]
    pub size_mb: u64,
}

/// SSH daemon hardening
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SshHardeningConfig {
    /// Drop-in file; must sort before any distribution drop-in
    #[validate(length(min = 1))]
    pub drop_in_path: String,
    pub main_config_path: String,
    pub banner_path: String,
    pub banner_text: String,
    #[validate(range(min = 1, max = 10))]
    pub max_auth_tries: u32,
    #[validate(range(min = 10, max = 600))]
    pub login_grace_time_secs: u32,
    pub client_alive_interval_secs: u32,
    pub client_alive_count_max: u32,
    #[validate(length(min = 1))]
    pub ciphers: Vec<String>,
    #[validate(length(min = 1))]
    pub macs: Vec<String>,
    #[validate(length(min = 1))]
    pub kex_algorithms: Vec<String>,
}

/// fail2ban jail thresholds
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BanConfig {
    pub jail_path: String,
    /// Preferred log file; the journal backend is used when it is absent
    pub auth_log_path: String,
    #[validate(range(min = 1, max = 100))]
    pub max_retry: u32,
    #[validate(range(min = 1))]
    pub find_time_secs: u64,
    #[validate(range(min = 1))]
    pub ban_time_secs: u64,
}

/// Third-party application installer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(url)]
    pub installer_url: String,
    /// Optional lowercase hex SHA-256 the downloaded script must match
    pub installer_sha256: Option<String>,
    /// Where the script is stored before it runs
    pub script_path: String,
    /// Package-manager-local bin dir, relative to the user's home
    pub local_bin_dir: String,
    pub app_port: u16,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            default_username: DEFAULT_USERNAME.to_string(),
            default_ssh_port: DEFAULT_SSH_PORT,
            reserved_ports: default_reserved_ports(),
            stock_port_delay_secs: 5,
            packages: [
                "curl",
                "ca-certificates",
                "sudo",
                "ufw",
                "fail2ban",
                "unattended-upgrades",
                "apt-listchanges",
                "systemd-timesyncd",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            swap: SwapConfig::default(),
            ssh: SshHardeningConfig::default(),
            fail2ban: BanConfig::default(),
            app: AppConfig::default(),
            reboot_delay_minutes: 1,
            transcript_path: Some(PathBuf::from("/var/log/ubuntu-harden-agent.log")),
        }
    }
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            path: "/swapfile".to_string(),
            size_mb: 2048,
        }
    }
}

impl Default for SshHardeningConfig {
    fn default() -> Self {
        Self {
            drop_in_path: "/etc/ssh/sshd_config.d/00-hardening.conf".to_string(),
            main_config_path: "/etc/ssh/sshd_config".to_string(),
            banner_path: "/etc/issue.net".to_string(),
            banner_text: concat!(
                "Authorized access only. All activity on this system is logged\n",
                "and monitored. Disconnect now if you are not an authorized user.\n",
            )
            .to_string(),
            max_auth_tries: 3,
            login_grace_time_secs: 30,
            client_alive_interval_secs: 300,
            client_alive_count_max: 2,
            ciphers: vec![
                "chacha20-poly1305@openssh.com".to_string(),
                "aes256-gcm@openssh.com".to_string(),
                "aes128-gcm@openssh.com".to_string(),
                "aes256-ctr".to_string(),
                "aes192-ctr".to_string(),
                "aes128-ctr".to_string(),
            ],
            macs: vec![
                "hmac-sha2-512-etm@openssh.com".to_string(),
                "hmac-sha2-256-etm@openssh.com".to_string(),
                "umac-128-etm@openssh.com".to_string(),
            ],
            kex_algorithms: vec![
                "curve25519-sha256".to_string(),
                "curve25519-sha256@libssh.org".to_string(),
                "diffie-hellman-group16-sha512".to_string(),
                "diffie-hellman-group18-sha512".to_string(),
            ],
        }
    }
}

impl Default for BanConfig {
    fn default() -> Self {
        Self {
            jail_path: "/etc/fail2ban/jail.local".to_string(),
            auth_log_path: "/var/log/auth.log".to_string(),
            max_retry: 5,
            find_time_secs: 600,
            ban_time_secs: 3600,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            installer_url: "https://openclaw.ai/install.sh".to_string(),
            installer_sha256: None,
            script_path: "/tmp/openclaw-install.sh".to_string(),
            local_bin_dir: ".npm-global/bin".to_string(),
            app_port: APP_PORT,
        }
    }
}

/// Well-known service ports plus the application's own port
pub fn default_reserved_ports() -> Vec<u16> {
    vec![
        21, 23, 25, 53, 80, 110, 143, 443, 465, 587, 993, 995, 3306, 5432, 6379, 27017, APP_PORT,
    ]
}

impl ProvisionConfig {
    /// Validate field constraints and cross-field rules
    pub fn validate_config(&self) -> crate::Result<()> {
        self.validate()
            .map_err(|e| crate::error::HardenError::config(e.to_string()))?;

        if !self.app.installer_url.starts_with("https://") {
            return Err(crate::error::HardenError::config(format!(
                "Installer URL must use HTTPS: {}",
                self.app.installer_url
            )));
        }

        if let Some(pin) = &self.app.installer_sha256 {
            if pin.len() != 64 || !pin.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(crate::error::HardenError::config(
                    "installer_sha256 must be 64 hex characters",
                ));
            }
        }

        if self.reserved_ports.contains(&self.default_ssh_port) {
            return Err(crate::error::HardenError::config(format!(
                "Default SSH port {} is in the reserved port list",
                self.default_ssh_port
            )));
        }

        Ok(())
    }

    /// Reserved ports, always including the application port
    pub fn reserved_ports(&self) -> Vec<u16> {
        let mut ports = self.reserved_ports.clone();
        if !ports.contains(&self.app.app_port) {
            ports.push(self.app.app_port);
        }
        ports.sort_unstable();
        ports
    }
}
