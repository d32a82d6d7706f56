// file: src/main.rs
// version: 2.1.0
// guid: b8c9d0e1-f2a3-4456-8890-234567bcdef0

//! Ubuntu Harden Agent - Main entry point

use clap::Parser;
use std::process::ExitCode;
use ubuntu_harden_agent::{
    cli::{args::Cli, commands::provision_command},
    logging::{logger, Transcript},
    reporter::print_error,
    steps::Interrupt,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let transcript = Transcript::new();
    if let Err(e) = logger::init_logger(cli.verbose, cli.quiet, &transcript) {
        eprintln!("{}", e);
    }

    // Ctrl-C never drops the run; the current step is compensated first
    let interrupt = Interrupt::new();
    interrupt.listen_for_ctrl_c();

    match provision_command(&cli, transcript, interrupt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            if e.is_precondition() {
                eprintln!("No changes were made to this host.");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
