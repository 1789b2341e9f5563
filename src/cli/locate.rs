use super::{job_matcher, jobs_root};
use crate::config::BenchctlConfig;
use crate::jobs::TrackingFile;
use crate::local_logger::suspend_progress_bar;
use crate::prelude::*;
use crate::process_table::{ProcessTable, SysinfoProcessTable};
use crate::tracker::MultiMatchPolicy;
use clap::Args;

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// The job directory, or its name under the jobs root
    pub job: String,

    /// Write the located process ID to the job's tracking file
    #[arg(long, default_value = "false")]
    pub persist: bool,

    /// What to do when several processes work on the job, overrides `runner.multi-match`
    #[arg(long)]
    pub multi_match: Option<MultiMatchPolicy>,
}

pub fn run(args: LocateArgs, config: &BenchctlConfig) -> Result<()> {
    let jobs = jobs_root(config)?;
    let mut matcher = job_matcher(config)?;
    if let Some(multi_match) = args.multi_match {
        matcher = matcher.with_multi_match(multi_match);
    }

    let job_dir = jobs.resolve(&args.job)?;
    let records = SysinfoProcessTable::new().snapshot()?;
    let pid = matcher.locate(&records, &job_dir.to_string_lossy())?;

    if args.persist {
        TrackingFile::Work.persist(&job_dir, pid)?;
        info!(
            "Wrote {pid} to {}",
            TrackingFile::Work.path(&job_dir).display()
        );
    }

    suspend_progress_bar(|| println!("{pid}"));
    Ok(())
}
