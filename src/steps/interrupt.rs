// file: src/steps/interrupt.rs
// version: 1.0.0
// guid: 4c8e2b71-9a3d-4f06-b5e8-1d7a6c30f952

//! Cooperative Ctrl-C handling.
//!
//! The signal never drops a run. It sets a flag the runner races against
//! the current step; the interrupted step is compensated before the run
//! returns [`HardenError::Interrupted`](crate::HardenError::Interrupted).

use crate::reporter::print_error;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Shared interrupt flag; clones observe the same state
#[derive(Clone, Debug)]
pub struct Interrupt {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request that the run stop at the next safe point
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`Interrupt::trigger`] has been called
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Route Ctrl-C to this flag. A second Ctrl-C exits immediately.
    pub fn listen_for_ctrl_c(&self) {
        let interrupt = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            warn!("Received Ctrl+C, undoing the current step (press again to exit without cleanup)");
            interrupt.trigger();

            if tokio::signal::ctrl_c().await.is_ok() {
                print_error("Second Ctrl+C, exiting without cleanup");
                std::process::exit(130);
            }
        });
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}
