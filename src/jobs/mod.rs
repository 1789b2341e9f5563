use crate::prelude::*;
use chrono::NaiveDateTime;
use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

mod tracking;

pub use tracking::{LOG_FILE_NAME, TrackingFile};

/// Suffix appended to the job prefix, e.g. `run-20251111_050224`
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Make `path` absolute and drop `.` components, `..` components and trailing separators, so
/// that it reads the same as the `--output` argument of the runner.
fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// The directory holding one output directory per job.
///
/// Job directories are named `<prefix><YYYYmmdd_HHMMSS>`. The same convention is used to create
/// new jobs and to find existing ones.
#[derive(Debug, Clone)]
pub struct JobsRoot {
    root: PathBuf,
    prefix: String,
    name_regex: Regex,
}

impl JobsRoot {
    pub fn new(root: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        ensure!(!prefix.is_empty(), "Job directory prefix must not be empty");
        let root = normalize_path(root.as_ref()).context("Invalid jobs root")?;
        let name_regex = Regex::new(&format!(r"^{}\d{{8}}_\d{{6}}$", regex::escape(prefix)))?;

        Ok(Self {
            root,
            prefix: prefix.to_owned(),
            name_regex,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_job_dir_name(&self, name: &str) -> bool {
        self.name_regex.is_match(name)
    }

    pub fn job_dir_name(&self, created_at: NaiveDateTime) -> String {
        format!("{}{}", self.prefix, created_at.format(TIMESTAMP_FORMAT))
    }

    /// Resolve a job given either its directory name or a path to it.
    pub fn resolve(&self, job: &str) -> Result<PathBuf> {
        let as_path = Path::new(job);
        if as_path.components().count() == 1 && !as_path.is_absolute() {
            normalize_path(&self.root.join(as_path))
        } else {
            normalize_path(as_path)
        }
    }

    /// Create the output directory of a new job.
    ///
    /// Fails if a job with the same timestamp already exists.
    pub fn create_job_dir(&self, created_at: NaiveDateTime) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create jobs root {}", self.root.display()))?;

        let job_dir = self.root.join(self.job_dir_name(created_at));
        match fs::create_dir(&job_dir) {
            Ok(()) => {
                debug!("Created job directory {}", job_dir.display());
                Ok(job_dir)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                bail!("Job directory {} already exists", job_dir.display())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to create job directory {}", job_dir.display())),
        }
    }

    /// List the job directories under the root, sorted by name (hence by creation time).
    pub fn list_jobs(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read jobs root {}", self.root.display()))?;

        let mut jobs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_job_dir_name(name) {
                    jobs.push(entry.path());
                }
            }
        }
        jobs.sort();

        Ok(jobs)
    }
}

#[cfg(test)]
pub(crate) fn test_timestamp(hms: (u32, u32, u32)) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 11, 11)
        .unwrap()
        .and_hms_opt(hms.0, hms.1, hms.2)
        .unwrap()
}
