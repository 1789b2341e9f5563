use super::{MessageFormat, job_matcher, jobs_root, print_json};
use crate::config::BenchctlConfig;
use crate::helpers::format_rss;
use crate::prelude::*;
use crate::process_table::{ProcessTable, SysinfoProcessTable};
use crate::tracker::JobStatus;
use clap::Args;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// The job directory, or its name under the jobs root
    pub job: String,

    #[arg(long, hide = true)]
    pub message_format: Option<MessageFormat>,
}

fn describe(status: &JobStatus) -> Vec<String> {
    let mut lines = vec![format!("Job: {}", status.job_dir.display())];

    lines.push(match (status.tracked_pid, &status.tracked_process) {
        (None, _) => "Tracked process: none recorded".to_string(),
        (Some(pid), Some(process)) => format!(
            "Tracked process: {pid} running (CPU {:.1}%, MEM {:.1}%, RSS {})",
            process.cpu_percent,
            process.mem_percent,
            format_rss(process.rss_kib)
        ),
        (Some(pid), None) => format!("Tracked process: {pid} not running"),
    });

    if let Some(launcher_pid) = status.launcher_pid {
        lines.push(format!(
            "Launcher process: {launcher_pid} {}",
            if status.launcher_alive { "running" } else { "exited" }
        ));
    }

    if let Some(located_pid) = status.located_pid.filter(|_| status.is_stale()) {
        lines.push(format!(
            "The job is now run by process {located_pid}, run `benchctl repair` to track it"
        ));
    }
    lines
}

pub fn run(args: StatusArgs, config: &BenchctlConfig) -> Result<()> {
    let jobs = jobs_root(config)?;
    let matcher = job_matcher(config)?;
    let records = SysinfoProcessTable::with_cpu_sampling().snapshot()?;

    let status = JobStatus::collect(&jobs.resolve(&args.job)?, &records, &matcher)?;

    if args.message_format == Some(MessageFormat::Json) {
        return print_json(&status);
    }

    let lines = describe(&status);
    for line in &lines {
        info!("{line}");
    }
    if status.is_stale() || !status.is_running() {
        warn!(
            "Job {} is {}",
            status.job_dir.display(),
            if status.is_running() { "tracked by a stale process ID" } else { "not running" }
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process_table::ProcessRecord;
    use std::path::PathBuf;

    fn status() -> JobStatus {
        JobStatus {
            job_dir: PathBuf::from("/root/jobs/run-20251111_050224"),
            tracked_pid: Some(4821),
            launcher_pid: Some(4819),
            tracked_process: Some(ProcessRecord {
                cpu_percent: 97.5,
                mem_percent: 1.5,
                rss_kib: 524_288,
                ..ProcessRecord::test(4821, "python -m pkg.run job")
            }),
            launcher_alive: false,
            located_pid: Some(4821),
        }
    }

    #[test]
    fn test_describe_running_job() {
        insta::assert_snapshot!(describe(&status()).join("\n"), @r"
        Job: /root/jobs/run-20251111_050224
        Tracked process: 4821 running (CPU 97.5%, MEM 1.5%, RSS 512.0 MiB)
        Launcher process: 4819 exited
        ");
    }

    #[test]
    fn test_describe_stale_job() {
        let status = JobStatus {
            tracked_pid: Some(4819),
            tracked_process: None,
            ..status()
        };

        insta::assert_snapshot!(describe(&status).join("\n"), @r"
        Job: /root/jobs/run-20251111_050224
        Tracked process: 4819 not running
        Launcher process: 4819 exited
        The job is now run by process 4821, run `benchctl repair` to track it
        ");
    }
}
