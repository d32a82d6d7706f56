// file: src/security/validation.rs
// version: 2.0.0
// guid: a7f7fc7b-b497-453c-9688-a2af6317bca2

//! Input validation utilities

use crate::error::HardenError;
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").unwrap_or_else(|e| panic!("static regex: {e}"))
    })
}

/// Utility functions for input validation
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate a POSIX-portable account name
    pub fn validate_username(username: &str) -> Result<()> {
        if !username_pattern().is_match(username) {
            return Err(HardenError::validation(format!(
                "Invalid username '{}': must start with a lowercase letter or underscore, \
                 contain only lowercase letters, digits, '_' or '-', and be at most 32 characters",
                username
            )));
        }

        // AllowUsers root plus PermitRootLogin no would lock everyone out
        if username == "root" {
            return Err(HardenError::validation(
                "Username 'root' cannot be used as the administrative account",
            ));
        }

        Ok(())
    }

    /// Parse and validate an SSH port against the reserved set
    pub fn validate_ssh_port(raw: &str, reserved: &[u16]) -> Result<u16> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(HardenError::validation(format!(
                "Invalid port '{}': must be a number between 1 and 65535",
                raw
            )));
        }

        let port = trimmed
            .parse::<u32>()
            .ok()
            .filter(|p| (1..=65535).contains(p))
            .ok_or_else(|| {
                HardenError::validation(format!(
                    "Invalid port '{}': must be between 1 and 65535",
                    raw
                ))
            })? as u16;

        if reserved.contains(&port) {
            return Err(HardenError::validation(format!(
                "Port {} is reserved for another service; choose a different SSH port",
                port
            )));
        }

        Ok(port)
    }

    /// Check `/etc/os-release` content for the Debian family
    pub fn validate_os_release(content: &str) -> Result<OsRelease> {
        let release = OsRelease::parse(content);

        if release.is_debian_family() {
            Ok(release)
        } else {
            Err(HardenError::unsupported_os(format!(
                "'{}' is not Debian or Ubuntu",
                release.pretty_name.as_deref().unwrap_or(&release.id)
            )))
        }
    }
}

/// Fields of interest from `/etc/os-release`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsRelease {
    pub id: String,
    pub id_like: Vec<String>,
    pub version_id: Option<String>,
    pub pretty_name: Option<String>,
}

impl OsRelease {
    /// Parse `KEY=value` lines, stripping optional quotes
    pub fn parse(content: &str) -> Self {
        let mut release = OsRelease::default();

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'').to_string();
            match key.trim() {
                "ID" => release.id = value.to_lowercase(),
                "ID_LIKE" => {
                    release.id_like = value
                        .split_whitespace()
                        .map(|s| s.to_lowercase())
                        .collect()
                }
                "VERSION_ID" => release.version_id = Some(value),
                "PRETTY_NAME" => release.pretty_name = Some(value),
                _ => {}
            }
        }

        release
    }

    /// Debian, Ubuntu, or a derivative declaring `ID_LIKE=debian`
    pub fn is_debian_family(&self) -> bool {
        matches!(self.id.as_str(), "debian" | "ubuntu")
            || self.id_like.iter().any(|like| like == "debian" || like == "ubuntu")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: &[u16] = &[21, 25, 80, 443, 3306, 18789];

    #[test]
    fn test_validate_username() {
        assert!(ValidationUtils::validate_username("openclaw").is_ok());
        assert!(ValidationUtils::validate_username("admin").is_ok());
        assert!(ValidationUtils::validate_username("_svc").is_ok());
        assert!(ValidationUtils::validate_username("user_01").is_ok());
        assert!(ValidationUtils::validate_username("test-user").is_ok());
        assert!(ValidationUtils::validate_username(&"a".repeat(32)).is_ok());

        assert!(ValidationUtils::validate_username("").is_err());
        assert!(ValidationUtils::validate_username("Admin").is_err());
        assert!(ValidationUtils::validate_username("1admin").is_err());
        assert!(ValidationUtils::validate_username("-admin").is_err());
        assert!(ValidationUtils::validate_username("ad min").is_err());
        assert!(ValidationUtils::validate_username("admin;rm").is_err());
        assert!(ValidationUtils::validate_username("admin\n").is_err());
        assert!(ValidationUtils::validate_username(&"a".repeat(33)).is_err());
        assert!(ValidationUtils::validate_username("root").is_err());
    }

    #[test]
    fn test_validate_ssh_port_accepts() {
        assert_eq!(ValidationUtils::validate_ssh_port("2222", RESERVED).unwrap(), 2222);
        assert_eq!(ValidationUtils::validate_ssh_port("8888", RESERVED).unwrap(), 8888);
        assert_eq!(ValidationUtils::validate_ssh_port("1", RESERVED).unwrap(), 1);
        assert_eq!(ValidationUtils::validate_ssh_port("65535", RESERVED).unwrap(), 65535);
        // stock port is allowed here; the warning happens elsewhere
        assert_eq!(ValidationUtils::validate_ssh_port("22", RESERVED).unwrap(), 22);
    }

    #[test]
    fn test_validate_ssh_port_rejects() {
        for raw in ["", "abc", "22a", "-1", "0", "65536", "99999999999", "1.5", "+22"] {
            assert!(
                ValidationUtils::validate_ssh_port(raw, RESERVED).is_err(),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_port_message() {
        let err = ValidationUtils::validate_ssh_port("443", RESERVED).unwrap_err();
        assert!(err.to_string().contains("reserved"));
        assert!(ValidationUtils::validate_ssh_port("18789", RESERVED).is_err());
    }

    #[test]
    fn test_os_release_ubuntu() {
        let content = "NAME=\"Ubuntu\"\nVERSION_ID=\"24.04\"\nID=ubuntu\nID_LIKE=debian\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n";
        let release = ValidationUtils::validate_os_release(content).unwrap();
        assert_eq!(release.id, "ubuntu");
        assert_eq!(release.version_id.as_deref(), Some("24.04"));
    }

    #[test]
    fn test_os_release_derivative() {
        let content = "ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n";
        assert!(ValidationUtils::validate_os_release(content).is_ok());
    }

    #[test]
    fn test_os_release_rejects_other_families() {
        let content = "ID=fedora\nPRETTY_NAME=\"Fedora Linux 40\"\n";
        let err = ValidationUtils::validate_os_release(content).unwrap_err();
        assert!(matches!(err, HardenError::UnsupportedOs(_)));
        assert!(err.to_string().contains("Fedora"));
    }
}
