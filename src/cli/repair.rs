use super::{MessageFormat, job_matcher, jobs_root, print_json};
use crate::config::BenchctlConfig;
use crate::local_logger::suspend_progress_bar;
use crate::prelude::*;
use crate::process_table::SysinfoProcessTable;
use crate::tracker::{RepairOutcome, RepairReport, repair_all};
use clap::Args;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Report what would change without writing any tracking file
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    #[arg(long, hide = true)]
    pub message_format: Option<MessageFormat>,
}

#[derive(Tabled)]
struct RepairRow {
    #[tabled(rename = "Job")]
    job: String,
    #[tabled(rename = "Result")]
    result: &'static str,
    #[tabled(rename = "PID")]
    pid: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub(super) fn job_label(job_dir: &Path) -> String {
    job_dir
        .file_name()
        .unwrap_or(job_dir.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn build_repair_table(report: &RepairReport) -> String {
    let rows: Vec<RepairRow> = report
        .entries
        .iter()
        .map(|entry| {
            let (result, pid, detail) = match &entry.outcome {
                RepairOutcome::Repaired { pid, previous } if entry.changed() => (
                    "repaired",
                    pid.to_string(),
                    previous.map_or("untracked".to_string(), |previous| {
                        format!("was {previous}")
                    }),
                ),
                RepairOutcome::Repaired { pid, .. } => {
                    ("unchanged", pid.to_string(), "-".to_string())
                }
                RepairOutcome::Unresolved { reason } => {
                    ("unresolved", "-".to_string(), reason.clone())
                }
                RepairOutcome::Skipped { reason } => ("skipped", "-".to_string(), reason.clone()),
                RepairOutcome::Failed { reason } => ("failed", "-".to_string(), reason.clone()),
            };
            RepairRow {
                job: job_label(&entry.job_dir),
                result,
                pid,
                detail,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

fn build_summary(report: &RepairReport) -> String {
    let changed = report.changed();
    format!(
        "{} jobs: {changed} {}, {} unchanged, {} unresolved, {} skipped, {} failed",
        report.entries.len(),
        if report.dry_run { "to repair" } else { "repaired" },
        report.repaired() - changed,
        report.unresolved(),
        report.skipped(),
        report.failed()
    )
}

pub fn run(args: RepairArgs, config: &BenchctlConfig) -> Result<()> {
    let jobs = jobs_root(config)?;
    let matcher = job_matcher(config)?;
    let table = SysinfoProcessTable::new();

    if args.dry_run {
        info!("Dry run, no tracking file will be written");
    }
    let report = repair_all(&jobs, &matcher, &table, args.dry_run)?;

    if args.message_format == Some(MessageFormat::Json) {
        return print_json(&report);
    }

    if report.entries.is_empty() {
        info!("No jobs found under {}", jobs.root().display());
        return Ok(());
    }

    let rendered = build_repair_table(&report);
    suspend_progress_bar(|| println!("{rendered}"));
    info!("{}", build_summary(&report));

    if report.failed() > 0 {
        bail!("Failed to repair {} jobs", report.failed());
    }
    Ok(())
}
