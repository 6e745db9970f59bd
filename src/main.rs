use clap::{ArgGroup, Parser};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use vuln_export::report::console;
use vuln_export::utils::today;
use vuln_export::{
    Config, Error, ErrorClass, ExportPipeline, ReportMode, RunEvent, RunOutcome, Scope, logging,
    run_until_signal,
};

#[derive(Parser)]
#[command(name = "vuln-export")]
#[command(about = "Export Snyk issues for a group or organization and summarize them by status and severity")]
#[command(version)]
#[command(group(ArgGroup::new("scope").required(true).args(["group_id", "org_id"])))]
struct Cli {
    /// Group to export
    #[arg(long)]
    group_id: Option<String>,

    /// Organization to export
    #[arg(long)]
    org_id: Option<String>,

    /// First day of the introduced-date filter (YYYY-MM-DD)
    #[arg(long)]
    date_from: String,

    /// Last day of the introduced-date filter (YYYY-MM-DD)
    #[arg(long)]
    date_to: String,

    /// Folder for results and the log file
    #[arg(long, default_value = "./results")]
    output_folder: PathBuf,

    /// Snyk API base URL
    #[arg(long, default_value = "https://api.snyk.io")]
    api_url: String,

    /// Snyk REST API version
    #[arg(long, default_value = "2024-10-15")]
    api_version: String,

    /// Report layout: organizations or single-scope (defaults from the scope kind)
    #[arg(long)]
    mode: Option<ReportMode>,

    /// Seconds between job status checks
    #[arg(long, default_value_t = 1)]
    poll_interval: u64,

    /// Give up waiting for the job after this many seconds
    #[arg(long)]
    max_wait: Option<u64>,

    /// Do not empty the output folder before the run
    #[arg(long)]
    keep_output: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default().with_token_from_env();
        config.api.base_url = self.api_url;
        config.api.version = self.api_version;
        config.export.scope = match (self.group_id, self.org_id) {
            (Some(group), _) => Scope::Group(group),
            (None, Some(org)) => Scope::Org(org),
            (None, None) => Scope::default(),
        };
        config.export.date_from = self.date_from;
        config.export.date_to = self.date_to;
        config.poll.interval = Duration::from_secs(self.poll_interval);
        config.poll.max_wait = self.max_wait.map(Duration::from_secs);
        config.output.dir = self.output_folder;
        config.output.clear_before_run = !self.keep_output;
        config.output.mode = self.mode;
        config
    }
}

fn step(number: u32, text: &str) {
    println!("{} {}", format!("Step {number}:").yellow().bold(), text);
}

fn done(text: &str) {
    println!("{} {}\n", "✓".green(), text);
}

fn print_error(title: &str, error: &Error) {
    eprintln!("\n{} {}", format!("{title}:").red().bold(), error);
}

fn print_banner(config: &Config) {
    let scope = &config.export.scope;
    let label = match scope {
        Scope::Group(_) => "Group ID:",
        Scope::Org(_) => "Org ID:",
    };
    println!("{}", "Snyk Issue Export".bold());
    println!("{} {}", label.bold(), scope.id().cyan());
    println!(
        "{} {} to {}",
        "Date Range:".bold(),
        config.export.date_from.cyan(),
        config.export.date_to.cyan()
    );
    println!(
        "{} {}",
        "Output Folder:".bold(),
        config.output.dir.display().to_string().cyan()
    );
    println!("{} {}", "API URL:".bold(), config.api.base_url.cyan());
    println!("{} {}\n", "API Version:".bold(), config.api.version.cyan());
}

async fn print_progress(mut events: broadcast::Receiver<RunEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };
        match event {
            RunEvent::JobSubmitted { job_id } => {
                done(&format!(
                    "Export job started with ID: {}",
                    job_id.as_str().cyan()
                ));
                step(3, "Waiting for export to complete...");
            }
            RunEvent::ResultsReady {
                total_rows, chunks, ..
            } => {
                done(&format!(
                    "Export completed: {} total rows in {} file(s)",
                    total_rows.to_string().cyan(),
                    chunks.to_string().cyan()
                ));
                step(4, "Saving JSON result...");
            }
            RunEvent::ResultSaved { .. } => {
                done("Saved result.json");
                step(5, "Downloading CSV files...");
            }
            RunEvent::ChunkProcessed { index, records } => {
                println!("  {} csv_{index}.csv: {records} record(s)", "✓".green());
            }
            RunEvent::ChunkFailed { index, reason } => {
                println!("  {} chunk {index}: {}", "✗".yellow(), reason.yellow());
            }
            RunEvent::DownloadsFinished {
                requested, parsed, ..
            } => {
                println!();
                done(&format!("Processed {parsed} of {requested} CSV file(s)"));
                step(6, "Generating results review...");
            }
            RunEvent::ReportWritten { statuses, .. } => {
                done(&format!(
                    "Saved {statuses} status set(s) (issues-{{status}}.csv + summary-{{status}}.csv)"
                ));
            }
        }
    }
}

fn print_summary(outcome: &RunOutcome, output: &Path, log_file: Option<&Path>) {
    println!("{}", "Summary".bold().underline());
    println!(
        "{} {}",
        "Total Rows:".bold(),
        outcome.declared_rows.to_string().green()
    );
    let chunks = format!(
        "{} of {} processed ({} downloaded)",
        outcome.chunks_parsed, outcome.chunks_requested, outcome.chunks_downloaded
    );
    if outcome.is_complete() {
        println!("{} {}", "CSV Files:".bold(), chunks.green());
    } else {
        println!("{} {}", "CSV Files:".bold(), chunks.yellow());
    }
    println!(
        "{} {} ({} with unrecognized severity)",
        "Records:".bold(),
        outcome.records.to_string().green(),
        outcome.unrecognized
    );
    println!(
        "{} {}",
        "Output Folder:".bold(),
        output.display().to_string().cyan()
    );
    if let Some(path) = log_file {
        println!("{} {}", "Log File:".bold(), path.display().to_string().cyan());
    }
    for warning in &outcome.warnings {
        println!("{} {}", "Warning:".yellow().bold(), warning);
    }
    println!();

    if outcome.report.tables.is_empty() {
        println!("{}", "No summary data to display.".yellow());
    }
    for table in &outcome.report.tables {
        println!("{}", console::render_status_table(table));
    }
    if let Some(summary) = &outcome.report.scope_summary {
        println!("{}", console::render_scope_summary(summary));
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let verbose = cli.verbose;
    let config = cli.into_config();

    if let Err(e) = config.validate() {
        print_error("Configuration Error", &e);
        return ExitCode::from(e.exit_code());
    }
    print_banner(&config);

    let output = config.output.dir.clone();
    let clearing = config.output.clear_before_run;
    let pipeline = ExportPipeline::new(config);

    step(1, "Preparing output folder...");
    if let Err(e) = pipeline.prepare_output().await {
        print_error("Output Error", &e);
        return ExitCode::from(e.exit_code());
    }
    done(if clearing {
        "Output folder cleared"
    } else {
        "Output folder ready"
    });

    let log_file = match logging::init(&output, today(), verbose) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("{} could not set up logging: {e}", "Warning:".yellow().bold());
            None
        }
    };

    let printer = tokio::spawn(print_progress(pipeline.subscribe()));
    step(2, "Starting export job...");
    let result = run_until_signal(pipeline.run()).await;
    drop(pipeline);
    printer.await.ok();

    match result {
        Ok(outcome) => {
            print_summary(&outcome, &output, log_file.as_deref());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "Run failed");
            let title = match &e {
                Error::Interrupted => "Interrupted",
                Error::Submission(_) => "Export Error",
                Error::Poll(_) => "Export Job Error",
                Error::Network(_) => "Request Error",
                _ => "Unexpected Error",
            };
            print_error(title, &e);
            ExitCode::from(e.exit_code())
        }
    }
}
