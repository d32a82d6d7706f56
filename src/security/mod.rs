// file: src/security/mod.rs
// version: 2.0.0
// guid: faf2e4de-ba5e-4b32-9917-3cd3e2b812c3

//! Input validation, host preflight and credential handling

pub mod credential;
pub mod preflight;
pub mod validation;

pub use credential::{collect_credential, Credential, PasswordPrompt, TerminalPrompt};
pub use preflight::{InvocationParams, Preflight};
pub use validation::{OsRelease, ValidationUtils};
