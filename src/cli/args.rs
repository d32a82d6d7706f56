// file: src/cli/args.rs
// version: 2.0.0
// guid: f6a7b8c9-d0e1-4234-9678-012345fabcde

//! Command line argument definitions

use crate::steps::RunOptions;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ubuntu-harden-agent")]
#[command(about = "Harden a fresh Debian/Ubuntu VM: admin user, SSH on a new port, firewall, auto-updates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Administrative account to create or reuse [default: openclaw]
    #[arg(short, long, env = "HARDEN_USER")]
    pub user: Option<String>,

    /// SSH port to move the daemon to [default: 2222]
    #[arg(short, long, env = "HARDEN_SSH_PORT")]
    pub port: Option<String>,

    /// Configuration file (TOML or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Show what would be done without changing the host")]
    pub dry_run: bool,

    #[arg(long, help = "Do not schedule a reboot at the end")]
    pub no_reboot: bool,

    #[arg(long, help = "Skip the third-party application install")]
    pub skip_app: bool,

    #[arg(long, help = "Print the final report as JSON")]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            reboot: !self.no_reboot,
            install_app: !self.skip_app,
            json: self.json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ubuntu-harden-agent"]).unwrap();
        let options = cli.run_options();

        assert!(options.reboot);
        assert!(options.install_app);
        assert!(!options.dry_run);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "ubuntu-harden-agent",
            "-u",
            "admin",
            "-p",
            "8888",
            "--no-reboot",
            "--skip-app",
            "--json",
        ])
        .unwrap();
        let options = cli.run_options();

        assert_eq!(cli.user.as_deref(), Some("admin"));
        assert_eq!(cli.port.as_deref(), Some("8888"));
        assert!(!options.reboot);
        assert!(!options.install_app);
        assert!(options.json);
    }

    #[test]
    fn test_port_kept_raw() {
        // non-numeric ports reach the validator instead of failing in clap
        let cli = Cli::try_parse_from(["ubuntu-harden-agent", "--port", "ssh"]).unwrap();
        assert_eq!(cli.port.as_deref(), Some("ssh"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["ubuntu-harden-agent", "-v", "-q"]).is_err());
    }
}
