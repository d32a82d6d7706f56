// file: src/logging/mod.rs
// version: 2.0.0
// guid: 1b9223e4-0594-4639-be27-994993a2db2a

//! Logging system for the hardening agent

pub mod logger;
pub mod transcript;

pub use logger::init_logger;
pub use transcript::Transcript;
