//! Validate email lists against a Kickbox-compatible verification service
//!
//! - `mailsift check <INPUT>` validates one list and writes the reports
//! - `mailsift serve` runs the HTTP front-end

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use mailsift::{
    config::Settings,
    controller::{self, CheckOptions},
};
use mailsift_common::logging;
use mailsift_verify::BatchStatus;

/// Validate email lists against a verification service
#[derive(Parser, Debug)]
#[command(name = "mailsift")]
#[command(about = "Validate email lists against a verification service", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (RON). Overrides `MAILSIFT_CONFIG` and the default
    /// locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a list of addresses, one per line
    Check {
        /// File to read addresses from, or `-` for standard input
        input: PathBuf,

        /// Where to write the text report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Where to write the deliverable addresses
        #[arg(long)]
        deliverable: Option<PathBuf>,

        /// Where to write the undeliverable addresses (CSV)
        #[arg(long)]
        undeliverable: Option<PathBuf>,

        /// Do not print per-address progress
        #[arg(short, long)]
        quiet: bool,
    },
    /// Run the HTTP front-end
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            input,
            report,
            deliverable,
            undeliverable,
            quiet,
        } => {
            let mut outputs = settings.output.paths();
            if let Some(report) = report {
                outputs.report = report;
            }
            if let Some(deliverable) = deliverable {
                outputs.deliverable = deliverable;
            }
            if let Some(undeliverable) = undeliverable {
                outputs.undeliverable = undeliverable;
            }

            let options = CheckOptions {
                input,
                outputs,
                quiet,
            };
            let summary = controller::run_check(&settings, &options).await?;

            println!();
            println!("Final Results:");
            println!("  Deliverable emails: {}", summary.deliverable_count);
            println!("  Undeliverable emails: {}", summary.undeliverable_count);
            println!("  Report: {}", options.outputs.report.display());

            Ok(match summary.status {
                BatchStatus::Complete => ExitCode::SUCCESS,
                BatchStatus::Aborted {
                    reason,
                    unprocessed,
                } => {
                    eprintln!("Batch aborted: {reason} ({unprocessed} emails not processed)");
                    ExitCode::FAILURE
                }
                BatchStatus::Cancelled { unprocessed } => {
                    eprintln!("Batch cancelled ({unprocessed} emails not processed)");
                    ExitCode::from(130)
                }
            })
        }
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                settings.web.listen_address = listen;
            }

            controller::serve(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
