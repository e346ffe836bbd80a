//! Command-line arguments for a correction run.
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{ArgGroup, Parser};

use billfix_core::{Protocol, Ticket};
use billfix_infra::{CsvTabularSource, Settings, TabularSource};
use billfix_observability::LogFormat;
use billfix_workflow::{
    CorrectionOptions, CorrectionRequest, RunMode, RunRequest, parse_activity_date, requests_from_rows,
};

#[derive(Parser, Debug)]
#[command(
    name = "billfix",
    version,
    about = "Correct payment activity-completion dates and resubmit affected invoices",
    after_help = "Without --commit the run is a dry run: every change is made, reported and then rolled back.\n\nExamples:\n  billfix --ticket OPS-42 --user ops@example.com --protocol P1 --gpid 0a11ce00 --activity-date 2024-Jan-05\n  billfix --ticket OPS-42 --user ops@example.com --file-path fixes.csv --force-update --commit",
    group(ArgGroup::new("input").required(true).args(["gpid", "file_path"]))
)]
pub struct Cli {
    /// Ticket reference recorded on every note
    #[arg(long, value_name = "TICKET")]
    pub ticket: String,

    /// Email of the operator the changes are attributed to
    #[arg(long, value_name = "EMAIL")]
    pub user: String,

    /// Payment id or leading part of it (single-record mode)
    #[arg(long, value_name = "GPID", requires_all = ["protocol", "activity_date"])]
    pub gpid: Option<String>,

    /// Protocol the payment belongs to (single-record mode)
    #[arg(long, value_name = "PROTOCOL")]
    pub protocol: Option<String>,

    /// New activity-completion date, YYYY-Mon-DD (single-record mode)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub activity_date: Option<NaiveDate>,

    /// CSV with gpid, payment_activity_date and protocol columns (batch mode)
    #[arg(long, value_name = "FILE")]
    pub file_path: Option<PathBuf>,

    /// Persist the changes
    #[arg(long)]
    pub commit: bool,

    /// Also resubmit invoices that carry a corrected payment
    #[arg(long)]
    pub force_update: bool,

    /// Skip regenerating invoice documents on commit
    #[arg(long)]
    pub no_document: bool,

    /// Store document (overrides BILLFIX_STORE)
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Receipt directory (overrides BILLFIX_RECEIPT_DIR)
    #[arg(long, value_name = "DIR")]
    pub receipt_dir: Option<PathBuf>,

    /// Invoice document directory (overrides BILLFIX_ARTIFACT_DIR)
    #[arg(long, value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, value_name = "FORMAT", env = "BILLFIX_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_activity_date(raw).map_err(|e| e.to_string())
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.file_path.is_some() {
            RunMode::Batch
        } else {
            RunMode::Single
        }
    }

    /// Apply flag overrides on top of environment settings.
    pub fn settings(&self, mut settings: Settings) -> Settings {
        if let Some(store) = &self.store {
            settings.store_path = store.clone();
        }
        if let Some(dir) = &self.receipt_dir {
            settings.receipt_dir = dir.clone();
        }
        if let Some(dir) = &self.artifact_dir {
            settings.artifact_dir = dir.clone();
        }
        settings
    }

    pub fn options(&self) -> Result<CorrectionOptions> {
        let ticket = Ticket::parse(&self.ticket).context("invalid --ticket")?;
        Ok(CorrectionOptions {
            ticket,
            force_update: self.force_update,
            commit: self.commit,
            generate_document: self.commit && !self.no_document,
        })
    }

    /// Build the run request, reading the input file in batch mode.
    pub fn run_request(&self) -> Result<RunRequest> {
        let requests = match self.mode() {
            RunMode::Batch => {
                let Some(path) = &self.file_path else {
                    bail!("--file-path is required in batch mode");
                };
                let rows = CsvTabularSource::new(path).rows()?;
                requests_from_rows(&rows)?
            }
            RunMode::Single => vec![self.single_request()?],
        };

        Ok(RunRequest {
            mode: self.mode(),
            actor_email: self.user.trim().to_string(),
            requests,
            options: self.options()?,
        })
    }

    fn single_request(&self) -> Result<CorrectionRequest> {
        let (Some(gpid), Some(protocol), Some(date)) = (&self.gpid, &self.protocol, self.activity_date)
        else {
            bail!("--gpid, --protocol and --activity-date are required together");
        };
        let protocol = Protocol::parse(protocol).context("invalid --protocol")?;
        Ok(CorrectionRequest::new(protocol, gpid, date)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["billfix", "--ticket", "OPS-1", "--user", "ops@example.com"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)
    }

    #[test]
    fn single_record_flags_build_a_dry_run() {
        let cli = parse(&["--gpid", "0a11ce00", "--protocol", "P1", "--activity-date", "2024-Jan-05"]).unwrap();
        let request = cli.run_request().unwrap();

        assert_eq!(request.mode, RunMode::Single);
        assert_eq!(request.requests.len(), 1);
        assert_eq!(request.requests[0].new_date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert!(!request.options.commit);
        assert!(!request.options.generate_document);
    }

    #[test]
    fn gpid_requires_protocol_and_date() {
        assert!(parse(&["--gpid", "0a11ce00"]).is_err());
        assert!(parse(&["--gpid", "0a11ce00", "--protocol", "P1"]).is_err());
    }

    #[test]
    fn exactly_one_input_source() {
        assert!(parse(&[]).is_err());
        assert!(
            parse(&[
                "--gpid", "0a11ce00", "--protocol", "P1", "--activity-date", "2024-Jan-05",
                "--file-path", "fixes.csv",
            ])
            .is_err()
        );
    }

    #[test]
    fn malformed_date_is_rejected_at_parse_time() {
        assert!(parse(&["--gpid", "0a11ce00", "--protocol", "P1", "--activity-date", "Jan 5"]).is_err());
    }

    #[test]
    fn documents_follow_commit_unless_disabled() {
        let commit = parse(&["--file-path", "fixes.csv", "--commit"]).unwrap();
        assert!(commit.options().unwrap().generate_document);

        let no_doc = parse(&["--file-path", "fixes.csv", "--commit", "--no-document"]).unwrap();
        assert!(!no_doc.options().unwrap().generate_document);
        assert_eq!(no_doc.mode(), RunMode::Batch);
    }

    #[test]
    fn flags_override_settings() {
        let cli = parse(&[
            "--file-path", "fixes.csv", "--store", "/data/store.json", "--artifact-dir", "/data/docs",
        ])
        .unwrap();
        let base = Settings {
            store_path: PathBuf::from("billfix-store.json"),
            receipt_dir: PathBuf::from("/tmp"),
            artifact_dir: PathBuf::from("/tmp/invoice-documents"),
        };
        let settings = cli.settings(base);
        assert_eq!(settings.store_path, PathBuf::from("/data/store.json"));
        assert_eq!(settings.receipt_dir, PathBuf::from("/tmp"));
        assert_eq!(settings.artifact_dir, PathBuf::from("/data/docs"));
    }
}
