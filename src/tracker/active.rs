use super::JobMatcher;
use crate::jobs::TrackingFile;
use crate::prelude::*;
use crate::process_table::ProcessRecord;
use serde::Serialize;
use std::path::PathBuf;

/// A running runner process, cross-referenced with its job's tracking file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
    pub pid: u32,
    /// `None` when the command line carries no recognizable output directory
    pub job_path: Option<PathBuf>,
    pub tracked_pid: Option<u32>,
    pub matches_tracking_file: bool,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub rss_kib: u64,
}

impl ActiveJob {
    fn from_record(record: ProcessRecord, matcher: &JobMatcher) -> Self {
        let job_path = matcher
            .extract_job_path(&record.command_line)
            .map(PathBuf::from);
        let tracked_pid = job_path.as_deref().and_then(|job_dir| {
            TrackingFile::Work.read_pid(job_dir).unwrap_or_else(|err| {
                debug!("Ignoring unreadable tracking file: {err:#}");
                None
            })
        });

        ActiveJob {
            pid: record.pid,
            job_path,
            tracked_pid,
            matches_tracking_file: tracked_pid == Some(record.pid),
            cpu_percent: record.cpu_percent,
            mem_percent: record.mem_percent,
            rss_kib: record.rss_kib,
        }
    }
}

/// Lazily enumerate every runner process in `records`, whatever the state of the tracking
/// files. Tracking files are only read.
pub fn list_active(
    records: Vec<ProcessRecord>,
    matcher: &JobMatcher,
) -> impl Iterator<Item = ActiveJob> + '_ {
    records
        .into_iter()
        .filter(|record| matcher.is_runner_process(record))
        .map(|record| ActiveJob::from_record(record, matcher))
}
