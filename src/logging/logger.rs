// file: src/logging/logger.rs
// version: 2.0.0
// guid: e384a312-9685-4048-95a7-a3f49b23bd73

//! Logger initialization and configuration

use super::transcript::Transcript;
use crate::Result;
use tracing::Instrument;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Pick the filter for the console, honoring `RUST_LOG` when no flag is set
fn console_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the logging system.
///
/// Console output goes to stderr so stdout stays clean for `--json`.
/// The transcript layer always records at debug level once activated.
pub fn init_logger(verbose: bool, quiet: bool, transcript: &Transcript) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(console_filter(verbose, quiet));

    let transcript_layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(transcript.make_writer())
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(transcript_layer)
        .try_init()
        .map_err(|e| {
            crate::error::HardenError::config(format!("Failed to initialize logger: {}", e))
        })?;

    Ok(())
}

/// Run `f` inside an `operation` span
pub fn with_operation_span<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let span = tracing::info_span!("operation", name = operation);
    let _enter = span.enter();
    f()
}

/// Async variant of [`with_operation_span`]
pub async fn with_async_operation_span<F, Fut, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    let span = tracing::info_span!("operation", name = operation);
    async move { f().await }.instrument(span).await
}
