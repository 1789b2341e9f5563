use super::JobMatcher;
use crate::jobs::TrackingFile;
use crate::prelude::*;
use crate::process_table::ProcessRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_dir: PathBuf,
    pub tracked_pid: Option<u32>,
    pub launcher_pid: Option<u32>,
    /// The tracked process, if it is still in the process table
    pub tracked_process: Option<ProcessRecord>,
    pub launcher_alive: bool,
    /// What a fresh scan of the process table finds for this job
    pub located_pid: Option<u32>,
}

impl JobStatus {
    pub fn collect(job_dir: &Path, records: &[ProcessRecord], matcher: &JobMatcher) -> Result<Self> {
        ensure!(
            job_dir.is_dir(),
            "Job directory {} does not exist",
            job_dir.display()
        );

        let tracked_pid = TrackingFile::Work.read_pid(job_dir)?;
        let launcher_pid = TrackingFile::Launcher.read_pid(job_dir)?;
        let find = |pid: Option<u32>| {
            pid.and_then(|pid| records.iter().find(|record| record.pid == pid))
        };

        let located_pid = match matcher.locate(records, &job_dir.to_string_lossy()) {
            Ok(pid) => Some(pid),
            Err(err) => {
                debug!("{err}");
                None
            }
        };

        Ok(JobStatus {
            job_dir: job_dir.to_path_buf(),
            tracked_pid,
            launcher_pid,
            tracked_process: find(tracked_pid).cloned(),
            launcher_alive: find(launcher_pid).is_some(),
            located_pid,
        })
    }

    pub fn is_running(&self) -> bool {
        self.tracked_process.is_some()
    }

    /// The tracking file disagrees with the process table, `repair` would rewrite it.
    pub fn is_stale(&self) -> bool {
        self.located_pid.is_some() && self.located_pid != self.tracked_pid
    }
}
