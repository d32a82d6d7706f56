// file: src/error.rs
// version: 3.0.0
// guid: b1b524e6-1f05-4e2e-96ce-3b53ecbc9ca1

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, HardenError>;

/// Error types for the hardening agent
#[derive(Error, Debug)]
pub enum HardenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("SSH configuration rejected by sshd -t: {0}")]
    SshConfigRejected(String),

    #[error("Step ordering violation: {0}")]
    Ordering(String),

    #[error("Command failed: {command} (exit code: {exit_code:?}): {stderr}")]
    ProcessError {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl HardenError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a new unsupported OS error
    pub fn unsupported_os(msg: impl Into<String>) -> Self {
        Self::UnsupportedOs(msg.into())
    }

    /// Create a new credential error
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a new ordering error
    pub fn ordering(msg: impl Into<String>) -> Self {
        Self::Ordering(msg.into())
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a process error for a command that could not be spawned
    pub fn spawn(command: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::ProcessError {
            command: command.into(),
            exit_code: None,
            stderr: format!("Failed to execute command: {}", err),
        }
    }

    /// True for failures detected before the host was touched
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Permission(_) | Self::UnsupportedOs(_) | Self::Credential(_)
        )
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted(_) => 130,
            _ => 1,
        }
    }
}
