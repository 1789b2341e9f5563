use super::JobMatcher;
use crate::error::TrackerError;
use crate::jobs::{JobsRoot, TrackingFile};
use crate::prelude::*;
use crate::process_table::{ProcessRecord, ProcessTable};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum RepairOutcome {
    /// A work process was found and written to the tracking file
    Repaired { pid: u32, previous: Option<u32> },
    /// No usable match in the process table
    Unresolved { reason: String },
    /// The job directory disappeared while repairing
    Skipped { reason: String },
    /// The tracking file could not be written
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairEntry {
    pub job_dir: PathBuf,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
}

impl RepairEntry {
    /// Whether the tracking file now holds a different ID than before.
    pub fn changed(&self) -> bool {
        matches!(self.outcome, RepairOutcome::Repaired { pid, previous } if previous != Some(pid))
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub dry_run: bool,
    pub entries: Vec<RepairEntry>,
}

impl RepairReport {
    fn count(&self, predicate: impl Fn(&RepairOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.outcome))
            .count()
    }

    pub fn repaired(&self) -> usize {
        self.count(|outcome| matches!(outcome, RepairOutcome::Repaired { .. }))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|outcome| matches!(outcome, RepairOutcome::Unresolved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RepairOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, RepairOutcome::Failed { .. }))
    }

    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|entry| entry.changed()).count()
    }
}

fn repair_job(
    job_dir: &Path,
    records: &[ProcessRecord],
    matcher: &JobMatcher,
    dry_run: bool,
) -> RepairOutcome {
    let job_path = job_dir.to_string_lossy();
    let pid = match matcher.locate(records, &job_path) {
        Ok(pid) => pid,
        Err(err) => {
            return RepairOutcome::Unresolved {
                reason: err.to_string(),
            };
        }
    };

    let previous = TrackingFile::Work.read_pid(job_dir).unwrap_or_else(|err| {
        debug!("Ignoring unreadable tracking file: {err:#}");
        None
    });

    if dry_run {
        return RepairOutcome::Repaired { pid, previous };
    }

    match TrackingFile::Work.persist(job_dir, pid) {
        Ok(()) => RepairOutcome::Repaired { pid, previous },
        Err(err @ TrackerError::TargetMissing { .. }) => RepairOutcome::Skipped {
            reason: err.to_string(),
        },
        Err(err) => RepairOutcome::Failed {
            reason: err.to_string(),
        },
    }
}

/// Rewrite the tracking file of every job under `jobs` that has a live work process.
///
/// Each job is handled on its own: a job that cannot be resolved or written is recorded in the
/// report and the batch carries on. With `dry_run`, nothing is written.
pub fn repair_all(
    jobs: &JobsRoot,
    matcher: &JobMatcher,
    table: &dyn ProcessTable,
    dry_run: bool,
) -> Result<RepairReport> {
    let job_dirs = jobs.list_jobs()?;
    let records = table.snapshot()?;
    debug!(
        "Repairing {} jobs against {} processes",
        job_dirs.len(),
        records.len()
    );

    let entries = job_dirs
        .into_iter()
        .map(|job_dir| {
            let outcome = repair_job(&job_dir, &records, matcher, dry_run);
            match &outcome {
                RepairOutcome::Repaired { pid, previous } if *previous != Some(*pid) => {
                    info!("{}: now tracking {pid}", job_dir.display())
                }
                RepairOutcome::Repaired { pid, .. } => {
                    debug!("{}: already tracking {pid}", job_dir.display())
                }
                RepairOutcome::Unresolved { reason } | RepairOutcome::Skipped { reason } => {
                    debug!("{}: {reason}", job_dir.display())
                }
                RepairOutcome::Failed { reason } => warn!("{}: {reason}", job_dir.display()),
            }
            RepairEntry { job_dir, outcome }
        })
        .collect();

    Ok(RepairReport { dry_run, entries })
}
