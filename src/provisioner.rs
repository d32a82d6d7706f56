// file: src/provisioner.rs
// version: 1.1.0
// guid: 5b0f3a7e-8d21-4c6a-9e47-2f1c8a9d6b34

//! Top-level provisioning run: validation, credentials, then the step list

use crate::config::ProvisionConfig;
use crate::error::HardenError;
use crate::logging::logger::with_operation_span;
use crate::logging::Transcript;
use crate::network::HostExecutor;
use crate::reporter::{print_warning, Progress, ProvisionReport, TOTAL_STAGES};
use crate::security::{collect_credential, InvocationParams, PasswordPrompt, Preflight};
use crate::steps::user::user_exists;
use crate::steps::{Interrupt, ProvisionContext, RunOptions, StepRunner};
use crate::Result;
use std::time::Duration;
use tracing::{debug, info};

/// Owns everything one run needs
pub struct Provisioner {
    config: ProvisionConfig,
    options: RunOptions,
    executor: Box<dyn HostExecutor>,
    prompt: Box<dyn PasswordPrompt>,
    transcript: Transcript,
    interrupt: Interrupt,
    quiet: bool,
}

impl Provisioner {
    pub fn new(
        config: ProvisionConfig,
        options: RunOptions,
        executor: Box<dyn HostExecutor>,
        prompt: Box<dyn PasswordPrompt>,
    ) -> Self {
        Self {
            config,
            options,
            executor,
            prompt,
            transcript: Transcript::new(),
            interrupt: Interrupt::new(),
            quiet: false,
        }
    }

    /// Use the transcript handle the logger was initialized with
    pub fn with_transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    /// Observe this flag instead of a private one
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Suppress progress lines
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run the whole sequence for the requested account and port.
    ///
    /// `username` and `port` are the raw flag values; config defaults fill
    /// in whatever is missing. Nothing on the host changes until both are
    /// valid and the host passes preflight.
    pub async fn run(
        &mut self,
        username: Option<&str>,
        port: Option<&str>,
    ) -> Result<ProvisionReport> {
        let mut progress = Progress::new(TOTAL_STAGES, self.quiet);

        progress.announce("Validating input and host");
        let params = with_operation_span("validate", || {
            InvocationParams::parse(&self.config, username, port)
        })?;
        let release = Preflight::check_host(self.executor.as_mut(), !self.options.dry_run).await?;
        info!(
            "Provisioning {} for {} on SSH port {}",
            release.pretty_name.as_deref().unwrap_or(&release.id),
            params.username,
            params.ssh_port
        );

        if params.keeps_stock_port() {
            print_warning(&format!(
                "SSH will stay on port 22 and keep attracting scanners; continuing in {}s (Ctrl-C to abort)",
                self.config.stock_port_delay_secs
            ));
            let delay = tokio::time::sleep(Duration::from_secs(self.config.stock_port_delay_secs));
            tokio::select! {
                _ = delay => {}
                _ = self.interrupt.triggered() => {
                    return Err(HardenError::Interrupted("aborted at the port 22 warning".to_string()));
                }
            }
        }

        progress.announce("Collecting credentials");
        let credential = if user_exists(self.executor.as_mut(), &params.username).await? {
            info!("Account {} exists; no password needed", params.username);
            None
        } else {
            Some(collect_credential(self.prompt.as_mut(), &params.username)?)
        };

        if self.interrupt.is_triggered() {
            return Err(HardenError::Interrupted(
                "stopped before any change to the host".to_string(),
            ));
        }

        self.activate_transcript();

        let mut ctx = ProvisionContext::new(
            self.config.clone(),
            params,
            self.options.clone(),
            credential,
        );
        debug!("Run {} starting", ctx.run_id);

        let runner = StepRunner::standard();
        runner
            .run(&mut ctx, self.executor.as_mut(), &mut progress, &self.interrupt)
            .await?;

        ctx.report
            .take()
            .ok_or_else(|| HardenError::ordering("run finished without producing a report"))
    }

    fn activate_transcript(&self) {
        if self.options.dry_run {
            return;
        }
        if let Some(path) = &self.config.transcript_path {
            match self.transcript.activate(path) {
                Ok(()) => debug!("Transcript at {}", path.display()),
                Err(e) => print_warning(&format!(
                    "Could not open transcript {}: {}",
                    path.display(),
                    e
                )),
            }
        }
    }
}
