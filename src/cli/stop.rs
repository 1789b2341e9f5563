use super::jobs_root;
use crate::config::BenchctlConfig;
use crate::prelude::*;
use crate::tracker::{StopOutcome, is_alive, stop_job};
use clap::Args;
use std::thread::sleep;
use std::time::Duration;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const EXIT_POLL_COUNT: u32 = 25;

#[derive(Args, Debug)]
pub struct StopArgs {
    /// The job directory, or its name under the jobs root
    pub job: String,

    /// Send SIGKILL instead of SIGTERM
    #[arg(long, default_value = "false")]
    pub force: bool,
}

fn wait_for_exit(pid: u32) -> bool {
    for _ in 0..EXIT_POLL_COUNT {
        if !is_alive(pid) {
            return true;
        }
        sleep(EXIT_POLL_INTERVAL);
    }
    !is_alive(pid)
}

pub fn run(args: StopArgs, config: &BenchctlConfig) -> Result<()> {
    let jobs = jobs_root(config)?;
    let job_dir = jobs.resolve(&args.job)?;

    match stop_job(&job_dir, args.force)? {
        StopOutcome::Signalled { pid, signal } => {
            info!("Sent {signal} to process {pid} of job {}", job_dir.display());
            if wait_for_exit(pid) {
                info!("Process {pid} exited");
            } else {
                warn!("Process {pid} is still running, use --force to kill it");
            }
        }
        StopOutcome::AlreadyGone { pid } => warn!(
            "Process {pid} of job {} is not running anymore, run `benchctl repair` if the job is still active",
            job_dir.display()
        ),
    }
    Ok(())
}
