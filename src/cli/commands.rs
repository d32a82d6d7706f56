// file: src/cli/commands.rs
// version: 2.0.0
// guid: a7b8c9d0-e1f2-4345-8789-123456abcdef

//! Command implementations for the CLI

use super::args::Cli;
use crate::{
    config::loader::ConfigLoader,
    logging::Transcript,
    network::{DryRunClient, HostExecutor, LocalClient},
    security::TerminalPrompt,
    steps::Interrupt,
    Provisioner, Result,
};
use tracing::info;

/// Provision the local host according to the parsed flags
pub async fn provision_command(cli: &Cli, transcript: Transcript, interrupt: Interrupt) -> Result<()> {
    let loader = ConfigLoader::new();
    let config = loader.load_or_default(cli.config.as_deref())?;
    let options = cli.run_options();

    let executor: Box<dyn HostExecutor> = if options.dry_run {
        info!("DRY RUN: no changes will be made to this host");
        Box::new(DryRunClient::new())
    } else {
        Box::new(LocalClient::new())
    };

    let json = options.json;
    let mut provisioner = Provisioner::new(config, options, executor, Box::new(TerminalPrompt::new()))
        .with_transcript(transcript)
        .with_interrupt(interrupt)
        .quiet(cli.quiet);

    let report = provisioner
        .run(cli.user.as_deref(), cli.port.as_deref())
        .await?;

    report.print(json)?;
    Ok(())
}
