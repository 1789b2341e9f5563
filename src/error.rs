use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Recoverable conditions of job tracking.
///
/// None of these is fatal: callers fall back to the launcher ID, skip the job, or ask the
/// continuation policy whether to go on.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No live process matches the job.
    #[error("No running process matches job {job}")]
    NotFound { job: String },

    /// Several processes match the job and the multi-match policy rejects guessing.
    #[error("Job {job} matches several processes {pids:?}, refusing to pick one")]
    AmbiguousMatch { job: String, pids: Vec<u32> },

    #[error("Job path must not be empty")]
    EmptyJobPath,

    /// The job directory is gone, so the job record itself is stale.
    #[error("Job directory {} does not exist", .path.display())]
    TargetMissing { path: PathBuf },

    #[error("Failed to write tracking file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry at {url} is unreachable: {reason}")]
    RegistryUnreachable { url: String, reason: String },

    /// The bounded wait ran out before every item became ready.
    #[error("Gave up after {waited:?} while waiting for {}", .pending.join(", "))]
    Timeout {
        waited: Duration,
        pending: Vec<String>,
    },
}
