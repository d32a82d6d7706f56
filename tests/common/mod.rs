// file: tests/common/mod.rs
// version: 1.1.0
// guid: 3e7c1a94-52b8-4f0d-a6e2-9d18c4b07f61

//! Scripted in-memory host shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use ubuntu_harden_agent::{
    config::ProvisionConfig,
    network::HostExecutor,
    security::PasswordPrompt,
    steps::RunOptions,
    HardenError, Provisioner, Result,
};

pub const UBUNTU_OS_RELEASE: &str = "NAME=\"Ubuntu\"\n\
VERSION_ID=\"24.04\"\n\
ID=ubuntu\n\
ID_LIKE=debian\n\
PRETTY_NAME=\"Ubuntu 24.04 LTS\"\n";

pub const ROOT_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExampleKeyMaterial operator@laptop\n";

/// Observable host state
#[derive(Debug, Default)]
pub struct HostState {
    pub files: HashMap<String, String>,
    pub modes: HashMap<String, u32>,
    pub users: HashSet<String>,
    /// Every mutating call, in order
    pub actions: Vec<String>,
    /// Text fed to stdin, by command
    pub stdin: Vec<(String, String)>,
    /// Commands containing one of these fail with the paired stderr
    pub failures: Vec<(String, String)>,
    pub swap_active: bool,
    pub euid: u32,
    pub socket_active: bool,
    pub installer_exit: i32,
    /// Installer never exits, like one waiting at a prompt
    pub installer_hangs: bool,
    pub address: Option<String>,
}

impl HostState {
    /// Index of the first action containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.contains(needle))
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

/// Executor over [`HostState`]; clones share state
#[derive(Clone)]
pub struct MockHost {
    state: Arc<Mutex<HostState>>,
}

impl MockHost {
    /// Fresh Ubuntu VM: root, no swap, no extra users, sshd happy
    pub fn fresh() -> Self {
        let mut state = HostState {
            euid: 0,
            address: Some("203.0.113.10".to_string()),
            ..Default::default()
        };
        state
            .files
            .insert("/etc/os-release".to_string(), UBUNTU_OS_RELEASE.to_string());
        state
            .files
            .insert("/etc/fstab".to_string(), "UUID=abcd / ext4 defaults 0 1\n".to_string());
        state
            .files
            .insert("/var/log/auth.log".to_string(), String::new());
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_root_keys(self) -> Self {
        self.state()
            .files
            .insert("/root/.ssh/authorized_keys".to_string(), ROOT_KEY.to_string());
        self
    }

    pub fn with_user(self, name: &str) -> Self {
        self.state().users.insert(name.to_string());
        self
    }

    pub fn failing(self, needle: &str, stderr: &str) -> Self {
        self.state()
            .failures
            .push((needle.to_string(), stderr.to_string()));
        self
    }

    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    /// Record a mutating call and apply its side effects
    fn act(&self, action: String) -> Result<()> {
        let mut state = self.state();
        state.actions.push(action.clone());

        if let Some((_, stderr)) = state
            .failures
            .iter()
            .find(|(needle, _)| action.contains(needle.as_str()))
        {
            return Err(HardenError::ProcessError {
                command: action.clone(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            });
        }

        if let Some(rest) = action.strip_prefix("exec: useradd ") {
            if let Some(name) = rest.split_whitespace().last() {
                let name = name.trim_matches('\'').to_string();
                state.users.insert(name);
            }
        }
        if action.starts_with("exec: swapon ") {
            state.swap_active = true;
        }
        Ok(())
    }
}

/// Pull the single-quoted argument following `prefix` out of `command`
fn quoted_arg<'a>(command: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = command.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('\'')?;
    rest.split('\'').next()
}

#[async_trait::async_trait]
impl HostExecutor for MockHost {
    async fn execute(&mut self, command: &str) -> Result<()> {
        self.act(format!("exec: {}", command))
    }

    async fn execute_with_output(&mut self, command: &str) -> Result<String> {
        let state = self.state();
        if command.starts_with("swapon --show") {
            return Ok(if state.swap_active {
                "/swapfile file 2G 0B -2\n".to_string()
            } else {
                String::new()
            });
        }
        if let Some(user) = quoted_arg(command, "getent passwd ") {
            return Ok(if state.users.contains(user) {
                format!("/home/{}\n", user)
            } else {
                String::new()
            });
        }
        Ok(String::new())
    }

    async fn check_silent(&mut self, command: &str) -> Result<bool> {
        let state = self.state();
        if let Some(user) = quoted_arg(command, "id -u ") {
            return Ok(state.users.contains(user));
        }
        if let Some(path) = quoted_arg(command, "test -f ") {
            return Ok(state.files.contains_key(path));
        }
        if command.contains("is-active --quiet ssh.socket") {
            return Ok(state.socket_active);
        }
        Ok(false)
    }

    async fn execute_with_stdin(&mut self, command: &str, input: &str) -> Result<()> {
        self.act(format!("stdin: {}", command))?;
        self.state()
            .stdin
            .push((command.to_string(), input.to_string()));
        Ok(())
    }

    async fn execute_interactive(&mut self, command: &str) -> Result<i32> {
        self.act(format!("interactive: {}", command))?;
        let (hangs, exit) = {
            let state = self.state();
            (state.installer_hangs, state.installer_exit)
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        Ok(exit)
    }

    async fn read_file(&mut self, path: &str) -> Result<Option<String>> {
        Ok(self.state().files.get(path).cloned())
    }

    async fn write_file(&mut self, path: &str, contents: &str, mode: u32) -> Result<()> {
        self.act(format!("write: {}", path))?;
        let mut state = self.state();
        state.files.insert(path.to_string(), contents.to_string());
        state.modes.insert(path.to_string(), mode);
        Ok(())
    }

    async fn remove_file(&mut self, path: &str) -> Result<()> {
        self.act(format!("remove: {}", path))?;
        self.state().files.remove(path);
        Ok(())
    }

    async fn download(&mut self, url: &str, dest: &str) -> Result<()> {
        self.act(format!("download: {} -> {}", url, dest))?;
        self.state()
            .files
            .insert(dest.to_string(), "#!/bin/bash\necho installing\n".to_string());
        Ok(())
    }

    async fn effective_uid(&mut self) -> Result<u32> {
        Ok(self.state().euid)
    }

    async fn primary_address(&mut self) -> Result<Option<String>> {
        Ok(self.state().address.clone())
    }
}

/// Prompt answering from a fixed list and counting calls
pub struct ScriptedPrompt {
    answers: Vec<String>,
    asked: Arc<Mutex<usize>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().rev().map(|a| a.to_string()).collect(),
            asked: Arc::new(Mutex::new(0)),
        }
    }

    /// Shared counter of prompts shown
    pub fn counter(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.asked)
    }
}

impl PasswordPrompt for ScriptedPrompt {
    fn read_password(&mut self, _label: &str) -> Result<String> {
        *self.asked.lock().unwrap() += 1;
        self.answers
            .pop()
            .ok_or_else(|| HardenError::credential("no scripted answer left"))
    }
}

/// Config with no delays and no transcript file
pub fn test_config() -> ProvisionConfig {
    ProvisionConfig {
        stock_port_delay_secs: 0,
        transcript_path: None,
        ..ProvisionConfig::default()
    }
}

pub fn provisioner(host: &MockHost, prompt: ScriptedPrompt, options: RunOptions) -> Provisioner {
    Provisioner::new(test_config(), options, Box::new(host.clone()), Box::new(prompt)).quiet(true)
}
