use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use billfix_infra::{JsonArtifactRenderer, JsonFileStore, Settings};
use billfix_invoicing::PaymentLineAggregator;
use billfix_workflow::{CorrectionError, Governor, ReceiptReporter, RunMode, RunReport};

mod cli;

use cli::Cli;

const EXIT_FAILED: u8 = 1;
const EXIT_DRY_RUN: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    billfix_observability::init(cli.log_format);

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "run failed before processing");
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let settings = cli.settings(Settings::from_env());
    let request = cli.run_request()?;
    tracing::info!(
        store = %settings.store_path.display(),
        mode = ?request.mode,
        requests = request.requests.len(),
        "starting correction run"
    );

    let governor = Governor::new(
        JsonFileStore::new(&settings.store_path),
        PaymentLineAggregator,
        JsonArtifactRenderer::new(&settings.artifact_dir),
    );

    let (report, error) = match governor.run(&request) {
        Ok(report) => (report, None),
        Err(failure) => (failure.report, Some(failure.error)),
    };

    print_report(&report);

    if report.mode == RunMode::Batch {
        match ReceiptReporter::new(&settings.receipt_dir).write(&report.records) {
            Ok(path) => println!("Receipt written to {}", path.display()),
            Err(err) => {
                tracing::error!(error = %err, "receipt not written");
                eprintln!("warning: {err}");
            }
        }
    }

    Ok(exit_code(error.as_ref()))
}

fn print_report(report: &RunReport) {
    for notice in &report.notices {
        println!("{}", notice.message);
    }
    for record in &report.records {
        println!(
            "{} {} -> {}: {} ({})",
            record.protocol,
            record.gpid,
            record.new_activity_date,
            record.status.as_str(),
            record.message
        );
    }
    for document in &report.documents {
        println!("invoice {} rendered to {}", document.invoice_number, document.location.display());
    }
    println!(
        "{} succeeded, {} failed{}",
        report.succeeded(),
        report.failed(),
        if report.committed { ", committed" } else { "" }
    );
}

fn exit_code(error: Option<&CorrectionError>) -> ExitCode {
    match error {
        None => ExitCode::SUCCESS,
        Some(err) if err.is_dry_run() => {
            println!("{err}");
            ExitCode::from(EXIT_DRY_RUN)
        }
        Some(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}
