use crate::VERSION;
use crate::config::BenchctlConfig;
use crate::jobs::JobsRoot;
use crate::local_logger::suspend_progress_bar;
use crate::prelude::*;
use crate::tracker::JobMatcher;
use clap::ValueEnum;
use serde::Serialize;

pub(crate) fn show_banner() {
    info!("benchctl v{VERSION}");
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum MessageFormat {
    Json,
}

/// Print `value` as pretty JSON on stdout, for scripts.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    suspend_progress_bar(|| println!("{json}"));
    Ok(())
}

pub(crate) fn jobs_root(config: &BenchctlConfig) -> Result<JobsRoot> {
    JobsRoot::new(config.jobs.root_path(), &config.jobs.prefix)
}

pub(crate) fn job_matcher(config: &BenchctlConfig) -> Result<JobMatcher> {
    JobMatcher::from_config(&config.runner)
}
