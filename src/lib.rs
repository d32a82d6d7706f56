// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # Ubuntu Harden Agent
//!
//! Provisions a fresh Debian or Ubuntu VM: system updates, swap, an
//! administrative account, SSH moved to a non-standard port, firewall and
//! ban daemon, unattended upgrades, and an optional third-party
//! application install, finishing with a connection report.
//!
//! Steps run strictly in order. The firewall is only enabled after SSH is
//! listening on its new port, and a rejected SSH configuration is rolled
//! back before anything else is touched.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod provisioner;
pub mod reporter;
pub mod security;
pub mod steps;

pub use error::{HardenError, Result};
pub use provisioner::Provisioner;

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
