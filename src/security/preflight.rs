// file: src/security/preflight.rs
// version: 1.0.0
// guid: ef55b740-f677-4050-ba8b-f447a5fd4b29

//! Precondition checks run before the host is touched

use super::validation::{OsRelease, ValidationUtils};
use crate::config::{ProvisionConfig, STOCK_SSH_PORT};
use crate::error::HardenError;
use crate::network::HostExecutor;
use crate::Result;
use tracing::{debug, warn};

/// Location of the OS identification file
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Validated invocation parameters; immutable for the rest of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParams {
    pub username: String,
    pub ssh_port: u16,
}

impl InvocationParams {
    /// Apply config defaults to the raw flags and validate the result
    pub fn parse(
        config: &ProvisionConfig,
        username: Option<&str>,
        port: Option<&str>,
    ) -> Result<Self> {
        let username = username.unwrap_or(&config.default_username);
        ValidationUtils::validate_username(username)?;

        let default_port = config.default_ssh_port.to_string();
        let raw_port = port.unwrap_or(&default_port);
        let ssh_port = ValidationUtils::validate_ssh_port(raw_port, &config.reserved_ports())?;

        Ok(Self {
            username: username.to_string(),
            ssh_port,
        })
    }

    /// SSH stays on 22; allowed, but the operator is warned
    pub fn keeps_stock_port(&self) -> bool {
        self.ssh_port == STOCK_SSH_PORT
    }
}

/// Host-level preconditions: privilege and OS family
pub struct Preflight;

impl Preflight {
    /// Check privilege and OS; `require_root` is relaxed for dry runs
    pub async fn check_host(exec: &mut dyn HostExecutor, require_root: bool) -> Result<OsRelease> {
        let uid = exec.effective_uid().await?;
        if uid != 0 {
            if require_root {
                return Err(HardenError::permission(
                    "this tool must be run as root (try: sudo)",
                ));
            }
            warn!("Not running as root; continuing because this is a dry run");
        }

        let content = exec.read_file(OS_RELEASE_PATH).await?.ok_or_else(|| {
            HardenError::unsupported_os(format!("{} not found", OS_RELEASE_PATH))
        })?;
        let release = ValidationUtils::validate_os_release(&content)?;

        debug!(
            "Detected {} {}",
            release.id,
            release.version_id.as_deref().unwrap_or("(unknown version)")
        );
        Ok(release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let config = ProvisionConfig::default();
        let params = InvocationParams::parse(&config, None, None).unwrap();
        assert_eq!(params.username, "openclaw");
        assert_eq!(params.ssh_port, 2222);
        assert!(!params.keeps_stock_port());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ProvisionConfig::default();
        let params = InvocationParams::parse(&config, Some("admin"), Some("8888")).unwrap();
        assert_eq!(params.username, "admin");
        assert_eq!(params.ssh_port, 8888);
    }

    #[test]
    fn test_stock_port_flagged() {
        let config = ProvisionConfig::default();
        let params = InvocationParams::parse(&config, None, Some("22")).unwrap();
        assert!(params.keeps_stock_port());
    }

    #[test]
    fn test_app_port_reserved() {
        let config = ProvisionConfig::default();
        assert!(InvocationParams::parse(&config, None, Some("18789")).is_err());
        assert!(InvocationParams::parse(&config, None, Some("443")).is_err());
    }
}
