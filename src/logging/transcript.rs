// file: src/logging/transcript.rs
// version: 1.0.0
// guid: 99648ebc-3f9b-4fc8-a321-28082562aafd

//! Deferred file mirror for the run log.
//!
//! The subscriber is installed at startup with a transcript layer whose
//! writer discards everything until [`Transcript::activate`] opens the log
//! file. Activation happens only after the password prompt, so nothing
//! sits between the operator's terminal and the prompt.

use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Shared handle to the optional transcript file
#[derive(Clone, Default)]
pub struct Transcript {
    file: Arc<Mutex<Option<File>>>,
}

/// Writer handed to the fmt layer for each event
pub struct TranscriptWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Transcript {
    /// Create an inactive transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Start mirroring log output to `path` (append mode)
    pub fn activate(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if let Ok(mut slot) = self.file.lock() {
            *slot = Some(file);
        }

        info!("Run transcript: {}", path.display());
        Ok(())
    }

    /// Whether a transcript file is open
    pub fn is_active(&self) -> bool {
        self.file.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Writer factory for `tracing_subscriber::fmt::Layer::with_writer`
    pub fn make_writer(&self) -> impl Fn() -> TranscriptWriter + Send + Sync + 'static {
        let file = Arc::clone(&self.file);
        move || TranscriptWriter {
            file: Arc::clone(&file),
        }
    }
}

impl Write for TranscriptWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(file) => file.write(buf),
                None => Ok(buf.len()),
            },
            // a poisoned lock only costs us log lines
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock() {
            Ok(mut slot) => match slot.as_mut() {
                Some(file) => file.flush(),
                None => Ok(()),
            },
            Err(_) => Ok(()),
        }
    }
}
