//! Mapping of jobs (output directories) to the OS processes doing their work.

use crate::config::RunnerConfig;
use crate::error::TrackerError;
use crate::prelude::*;
use crate::process_table::ProcessRecord;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

mod active;
mod repair;
mod signal;
mod status;

pub use active::{ActiveJob, list_active};
pub use repair::{RepairEntry, RepairOutcome, RepairReport, repair_all};
pub use signal::{StopOutcome, is_alive, stop_job};
pub use status::JobStatus;

/// What `locate` does when several processes match the same job.
#[derive(ValueEnum, Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MultiMatchPolicy {
    /// Keep the first match in enumeration order and warn about the others
    #[default]
    First,
    /// Refuse to pick, the job needs manual disambiguation
    Reject,
}

/// Recognizes runner processes in a process table.
#[derive(Debug, Clone)]
pub struct JobMatcher {
    marker: String,
    wrapper_markers: Vec<String>,
    output_pattern: Regex,
    multi_match: MultiMatchPolicy,
}

impl JobMatcher {
    /// - `marker`: substring identifying the runner program in a command line
    /// - `wrapper_markers`: substrings identifying launchers (environment activation shims,
    ///   shells) that carry the same arguments as the runner but do not do the work
    /// - `output_pattern`: regex whose first capture group is the job path
    pub fn new(
        marker: &str,
        wrapper_markers: &[String],
        output_pattern: &str,
        multi_match: MultiMatchPolicy,
    ) -> Result<Self> {
        ensure!(!marker.is_empty(), "The runner marker must not be empty");
        let output_pattern = Regex::new(output_pattern)
            .with_context(|| format!("Invalid output pattern '{output_pattern}'"))?;
        ensure!(
            output_pattern.captures_len() > 1,
            "The output pattern must capture the job path in a group"
        );

        Ok(Self {
            marker: marker.to_owned(),
            wrapper_markers: wrapper_markers
                .iter()
                .filter(|wrapper_marker| !wrapper_marker.is_empty())
                .cloned()
                .collect(),
            output_pattern,
            multi_match,
        })
    }

    pub fn from_config(runner: &RunnerConfig) -> Result<Self> {
        Self::new(
            &runner.marker,
            &runner.wrapper_markers,
            &runner.output_pattern,
            runner.multi_match,
        )
    }

    pub fn with_multi_match(mut self, multi_match: MultiMatchPolicy) -> Self {
        self.multi_match = multi_match;
        self
    }

    fn is_wrapper(&self, command_line: &str) -> bool {
        self.wrapper_markers
            .iter()
            .any(|wrapper_marker| command_line.contains(wrapper_marker.as_str()))
    }

    /// Whether the record is a runner process doing actual work, for any job.
    pub fn is_runner_process(&self, record: &ProcessRecord) -> bool {
        record.command_line.contains(&self.marker) && !self.is_wrapper(&record.command_line)
    }

    /// Extract the job path from a runner command line.
    pub fn extract_job_path<'a>(&self, command_line: &'a str) -> Option<&'a str> {
        self.output_pattern
            .captures(command_line)
            .and_then(|captures| captures.get(1))
            .map(|path| path.as_str())
    }

    /// Find the process doing the work of the job whose output directory is `job_path`.
    ///
    /// `records` must be in process table enumeration order, the first candidate wins under
    /// [`MultiMatchPolicy::First`].
    pub fn locate(&self, records: &[ProcessRecord], job_path: &str) -> Result<u32, TrackerError> {
        if job_path.is_empty() {
            return Err(TrackerError::EmptyJobPath);
        }

        let candidates: Vec<u32> = records
            .iter()
            .filter(|record| record.command_line.contains(job_path))
            .filter(|record| self.is_runner_process(record))
            .map(|record| record.pid)
            .collect();

        match candidates.as_slice() {
            [] => {
                return Err(TrackerError::NotFound {
                    job: job_path.to_owned(),
                });
            }
            [pid] => return Ok(*pid),
            _ => {}
        }

        match self.multi_match {
            MultiMatchPolicy::First => {
                let first = candidates[0];
                warn!(
                    "Job {job_path} matches several processes {candidates:?}, tracking the first one ({first})"
                );
                Ok(first)
            }
            MultiMatchPolicy::Reject => Err(TrackerError::AmbiguousMatch {
                job: job_path.to_owned(),
                pids: candidates,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_matcher() -> JobMatcher {
    JobMatcher::new(
        "pkg.run",
        &["bin/conda run".to_string(), "sh -c ".to_string()],
        r"--output[= ](\S+)",
        MultiMatchPolicy::First,
    )
    .unwrap()
}
