// file: src/reporter/mod.rs
// version: 2.0.0
// guid: 1b8752db-458d-463e-a885-df853de2ec75

//! Operator-facing output: numbered progress lines and the final report

use crate::steps::InstallerOutcome;
use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

/// Number of stages in a full run
pub const TOTAL_STAGES: usize = 10;

/// Prints `[n/total] message` lines to stderr
#[derive(Debug)]
pub struct Progress {
    current: usize,
    total: usize,
    quiet: bool,
}

impl Progress {
    pub fn new(total: usize, quiet: bool) -> Self {
        Self {
            current: 0,
            total,
            quiet,
        }
    }

    /// Advance to the next stage and announce it
    pub fn announce(&mut self, message: &str) -> usize {
        self.current += 1;
        if !self.quiet {
            eprintln!("{} {}", self.prefix().cyan().bold(), message);
        }
        self.current
    }

    /// Stage number last announced
    pub fn current(&self) -> usize {
        self.current
    }

    fn prefix(&self) -> String {
        format!("[{}/{}]", self.current, self.total)
    }
}

/// Print a failure line the way every stage does
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Print a warning line
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), message);
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub run_id: Uuid,
    pub username: String,
    pub ssh_port: u16,
    pub address: Option<String>,
    pub keys_present: bool,
    pub password_auth_enabled: bool,
    /// Offered only when key login should already work
    pub disable_password_command: Option<String>,
    pub installer: InstallerOutcome,
    pub reboot_scheduled: bool,
    pub reboot_delay_minutes: u32,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl ProvisionReport {
    /// `ssh` command the operator should use from now on
    pub fn ssh_command(&self) -> String {
        format!(
            "ssh -p {} {}@{}",
            self.ssh_port,
            self.username,
            self.address.as_deref().unwrap_or("<server-ip>")
        )
    }

    /// Plain-text summary (no colors), suitable for logs and tests
    pub fn render_text(&self) -> String {
        let address = self.address.as_deref().unwrap_or("<server-ip>");
        let mut out = String::new();

        out.push_str("Provisioning complete\n\n");
        out.push_str(&format!("  User:     {}\n", self.username));
        out.push_str(&format!("  SSH port: {}\n", self.ssh_port));
        out.push_str(&format!("  Address:  {}\n\n", address));
        out.push_str(&format!("Connect with:\n  {}\n\n", self.ssh_command()));

        match &self.disable_password_command {
            Some(cmd) => {
                out.push_str("Password login is still enabled. After confirming key login works, disable it:\n");
                out.push_str(&format!("  {}\n\n", cmd));
            }
            None => {
                out.push_str("Password login is enabled. Add a key before disabling it:\n");
                out.push_str(&format!(
                    "  ssh-copy-id -p {} {}@{}\n\n",
                    self.ssh_port, self.username, address
                ));
            }
        }

        if let InstallerOutcome::Failed(reason) = &self.installer {
            out.push_str(&format!(
                "Application install failed: {}\nRe-run the installer manually as {}.\n\n",
                reason, self.username
            ));
        }

        if self.reboot_scheduled {
            out.push_str(&format!(
                "Reboot scheduled in {} minute(s). Do not close this session until you have tested the new port.\n",
                self.reboot_delay_minutes
            ));
        } else {
            out.push_str("Reboot skipped. Reboot manually to finish applying upgrades.\n");
        }

        out
    }

    /// Print the summary to stdout
    pub fn print(&self, json: bool) -> crate::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
            return Ok(());
        }

        let text = self.render_text();
        let mut lines = text.lines();
        if let Some(title) = lines.next() {
            println!("\n{}", title.green().bold());
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }
}
