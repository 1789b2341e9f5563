use super::repair::job_label;
use super::{MessageFormat, job_matcher, print_json};
use crate::config::BenchctlConfig;
use crate::helpers::format_rss;
use crate::local_logger::suspend_progress_bar;
use crate::prelude::*;
use crate::process_table::{ProcessTable, SysinfoProcessTable};
use crate::tracker::{ActiveJob, list_active};
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Args, Debug)]
pub struct PsArgs {
    #[arg(long, hide = true)]
    pub message_format: Option<MessageFormat>,
}

#[derive(Tabled)]
struct ActiveJobRow {
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "Job")]
    job: String,
    #[tabled(rename = "Tracked")]
    tracked: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "MEM")]
    mem: String,
    #[tabled(rename = "RSS")]
    rss: String,
}

impl From<&ActiveJob> for ActiveJobRow {
    fn from(job: &ActiveJob) -> Self {
        let tracked = match (&job.job_path, job.tracked_pid) {
            (None, _) => "-".to_string(),
            (Some(_), None) => "untracked".to_string(),
            (Some(_), Some(_)) if job.matches_tracking_file => "yes".to_string(),
            (Some(_), Some(tracked_pid)) => format!("no ({tracked_pid})"),
        };

        ActiveJobRow {
            pid: job.pid,
            job: job
                .job_path
                .as_deref()
                .map_or("<unknown>".to_string(), job_label),
            tracked,
            cpu: format!("{:.1}%", job.cpu_percent),
            mem: format!("{:.1}%", job.mem_percent),
            rss: format_rss(job.rss_kib),
        }
    }
}

fn build_active_table(jobs: &[ActiveJob]) -> String {
    let mut table = Table::new(jobs.iter().map(ActiveJobRow::from));
    table.with(Style::modern());
    table.to_string()
}

pub fn run(args: PsArgs, config: &BenchctlConfig) -> Result<()> {
    let matcher = job_matcher(config)?;
    let records = SysinfoProcessTable::with_cpu_sampling().snapshot()?;
    let jobs: Vec<ActiveJob> = list_active(records, &matcher).collect();

    if args.message_format == Some(MessageFormat::Json) {
        return print_json(&jobs);
    }

    if jobs.is_empty() {
        info!("No benchmark run is active");
        return Ok(());
    }

    let rendered = build_active_table(&jobs);
    suspend_progress_bar(|| println!("{rendered}"));

    let stale = jobs
        .iter()
        .filter(|job| job.job_path.is_some() && !job.matches_tracking_file)
        .count();
    if stale > 0 {
        warn!("{stale} processes are not the tracked ones, run `benchctl repair` to update them");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn active_job(
        pid: u32,
        job: Option<&str>,
        tracked_pid: Option<u32>,
        (cpu_percent, mem_percent, rss_kib): (f32, f32, u64),
    ) -> ActiveJob {
        ActiveJob {
            pid,
            job_path: job.map(|name| PathBuf::from("/root/jobs").join(name)),
            tracked_pid,
            matches_tracking_file: tracked_pid == Some(pid),
            cpu_percent,
            mem_percent,
            rss_kib,
        }
    }

    #[test]
    fn test_active_table() {
        let jobs = vec![
            active_job(
                4821,
                Some("run-20251111_050224"),
                Some(4821),
                (97.5, 1.5, 3 * 1_048_576 + 524_288),
            ),
            active_job(
                5002,
                Some("run-20251111_060000"),
                Some(4999),
                (0.0, 0.5, 524_288),
            ),
            active_job(6100, None, None, (12.0, 0.3, 900)),
            active_job(7000, Some("run-20251111_070000"), None, (3.0, 0.2, 2048)),
        ];

        insta::assert_snapshot!(build_active_table(&jobs), @r"
        ┌──────┬─────────────────────┬───────────┬───────┬──────┬───────────┐
        │ PID  │ Job                 │ Tracked   │ CPU   │ MEM  │ RSS       │
        ├──────┼─────────────────────┼───────────┼───────┼──────┼───────────┤
        │ 4821 │ run-20251111_050224 │ yes       │ 97.5% │ 1.5% │ 3.5 GiB   │
        ├──────┼─────────────────────┼───────────┼───────┼──────┼───────────┤
        │ 5002 │ run-20251111_060000 │ no (4999) │ 0.0%  │ 0.5% │ 512.0 MiB │
        ├──────┼─────────────────────┼───────────┼───────┼──────┼───────────┤
        │ 6100 │ <unknown>           │ -         │ 12.0% │ 0.3% │ 900 KiB   │
        ├──────┼─────────────────────┼───────────┼───────┼──────┼───────────┤
        │ 7000 │ run-20251111_070000 │ untracked │ 3.0%  │ 0.2% │ 2.0 MiB   │
        └──────┴─────────────────────┴───────────┴───────┴──────┴───────────┘
        ");
    }
}
