// file: src/network/mod.rs
// version: 2.0.0
// guid: a02eb84f-3283-49aa-bb7d-2ba3c8e72f1e

//! Host command execution and downloads

pub mod download;
pub mod dry_run;
pub mod executor;
pub mod local;

pub use download::NetworkDownloader;
pub use dry_run::DryRunClient;
pub use executor::HostExecutor;
pub use local::LocalClient;
