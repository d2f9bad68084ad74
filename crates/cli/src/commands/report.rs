//! Report command: poll every target, print, export

use anyhow::{bail, Context, Result};
use chrono::Local;
use report_lib::{PrismClient, ReportSink, RunCoordinator, RunFailure, StructuredLogger};
use std::path::Path;

use crate::config::{load_targets, Credentials, Settings};
use crate::export::{CsvSink, DiscardSink};
use crate::output::{print_error, print_info, print_report, print_success};
use crate::Cli;

/// Run the full pipeline and write the report if every target succeeded
pub async fn run_report(cli: &Cli, targets: &Path, output_dir: &Path, no_export: bool) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let targets = load_targets(targets)?;
    if targets.is_empty() {
        bail!("No Prism Central addresses found in targets file");
    }

    let credentials = Credentials::resolve(&cli.username, cli.password.as_deref())?;
    let client = PrismClient::new(settings.client_config(credentials, cli.verify_tls))
        .context("Failed to create HTTP client")?;

    let logger = StructuredLogger::for_now();
    let mut coordinator = RunCoordinator::new(&client, settings.poller_config(), logger);

    print_info(&format!("Polling {} Prism Central instance(s)", targets.len()));

    let mut csv_sink = CsvSink::new(output_dir, Local::now());
    let mut discard = DiscardSink;
    let sink: &mut dyn ReportSink = if no_export { &mut discard } else { &mut csv_sink };

    let summary = match coordinator.run(&targets, sink).await {
        Ok(summary) => summary,
        Err(err) => {
            match err.downcast_ref::<RunFailure>() {
                Some(failure) => print_error(&format!(
                    "Run failed at {} ({} stage): {}",
                    failure.address, failure.stage, failure.source
                )),
                None => print_error(&format!("{:#}", err)),
            }
            return Err(err.context("No report written"));
        }
    };

    print_report(&summary.rows, cli.format);

    if csv_sink.written() {
        print_success(&format!(
            "Wrote {} row(s) from {} instance(s) to {}",
            summary.rows.len(),
            summary.instances,
            csv_sink.path().display()
        ));
    } else {
        print_success(&format!(
            "Collected {} row(s) from {} instance(s)",
            summary.rows.len(),
            summary.instances
        ));
    }

    Ok(())
}
