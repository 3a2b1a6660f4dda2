use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use anyhow::Context;
use mailsift_common::{Signal, internal};
use mailsift_report::{OutputPaths, write_outputs};
use mailsift_verify::{
    BatchProcessor, ClassifiedRecord, KickboxService, Progress, ProgressObserver, RateLimiter,
    ResultAggregator, Summary, VerificationClient,
};
use mailsift_web::{AppState, WebServer};
use tokio::{io::AsyncReadExt, sync::broadcast};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// Build the processing pipeline described by `settings`.
///
/// The returned processor owns the only rate limiter in the process; clone
/// it rather than building another.
///
/// # Errors
///
/// Returns an error if the verification service cannot be configured.
pub fn build_processor(settings: &Settings) -> anyhow::Result<BatchProcessor> {
    let service = KickboxService::new(&settings.verification)
        .context("Unable to configure the verification service")?;

    internal!(
        level = DEBUG,
        endpoint = %service.endpoint(),
        min_interval_ms = settings.rate_limit.min_interval_ms,
        max_attempts = settings.retry.max_attempts,
        "Verification pipeline configured"
    );

    Ok(BatchProcessor::new(VerificationClient::new(
        Arc::new(service),
        Arc::new(RateLimiter::from_config(&settings.rate_limit)),
        settings.retry.clone(),
    )))
}

/// Read the address list at `path`, or standard input for `-`.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub async fn read_input(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read addresses from stdin")?;
        text
    } else {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read addresses from {}", path.display()))?
    };

    Ok(mailsift_common::parse_address_list(&text))
}

/// Prints one line per resolved address
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, progress: Progress, record: &ClassifiedRecord) {
        if record.reason.is_empty() {
            println!(
                "[{}/{}] {}: {}",
                progress.processed, progress.total, record.address, record.classification
            );
        } else {
            println!(
                "[{}/{}] {}: {} ({})",
                progress.processed,
                progress.total,
                record.address,
                record.classification,
                record.reason
            );
        }
    }
}

/// Options for a single `check` run
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub input: PathBuf,
    pub outputs: OutputPaths,
    pub quiet: bool,
}

/// Validate one list and write its reports.
///
/// The batch stops early when `cancel` fires; whatever was resolved by then
/// is still reported.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the pipeline cannot be
/// built, or the reports cannot be written.
pub async fn check(
    settings: &Settings,
    options: &CheckOptions,
    cancel: &CancellationToken,
) -> anyhow::Result<Summary> {
    let processor = build_processor(settings)?;
    let addresses = read_input(&options.input).await?;

    if addresses.is_empty() {
        internal!(level = WARN, input = %options.input.display(), "No addresses to validate");
    }

    let result = if options.quiet {
        processor
            .process(&addresses, &mailsift_verify::NoProgress, cancel)
            .await
    } else {
        processor
            .process(&addresses, &ConsoleProgress, cancel)
            .await
    };

    let summary = ResultAggregator::aggregate(&result);
    write_outputs(&summary, &options.outputs, &chrono::Local::now())?;

    Ok(summary)
}

/// Resolves once the process is asked to stop.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be installed.
pub async fn wait_for_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            r = tokio::signal::ctrl_c() => {
                r?;
                internal!("CTRL+C entered, shutting down");
            }
            _ = terminate.recv() => {
                internal!("Terminate Signal received, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        internal!("CTRL+C entered, shutting down");
    }

    Ok(())
}

/// Run `check`, cancelling the batch on Ctrl-C/SIGTERM.
///
/// # Errors
///
/// See [`check`].
pub async fn run_check(settings: &Settings, options: &CheckOptions) -> anyhow::Result<Summary> {
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if wait_for_signal().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let summary = check(settings, options, &cancel).await;
    watcher.abort();

    summary
}

/// Run the HTTP front-end until Ctrl-C/SIGTERM.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be built, the listener cannot be
/// bound, or the server fails.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(build_processor(settings)?);
    let server = WebServer::new(settings.web.clone(), state).await?;

    internal!(level = INFO, "Controller running");

    let mut serving = tokio::spawn(server.serve(SHUTDOWN_BROADCAST.subscribe()));

    tokio::select! {
        r = &mut serving => {
            r??;
            return Ok(());
        }
        r = wait_for_signal() => r?,
    }

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| anyhow::anyhow!("Unable to broadcast shutdown: {e}"))?;

    serving.await??;
    internal!(level = INFO, "Shut down");

    Ok(())
}
