use crate::error::TrackerError;
use crate::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives the runner's stdout and stderr
pub const LOG_FILE_NAME: &str = "run.log";

/// A per-job file holding a single process ID as a decimal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingFile {
    /// The process doing the job's work. This is the ID `stop` signals.
    Work,
    /// The process spawned by the launcher, kept for reference only.
    Launcher,
}

impl TrackingFile {
    pub fn file_name(self) -> &'static str {
        match self {
            TrackingFile::Work => "run.pid",
            TrackingFile::Launcher => "launcher.pid",
        }
    }

    pub fn path(self, job_dir: &Path) -> PathBuf {
        job_dir.join(self.file_name())
    }

    /// Overwrite the tracking file with `pid`.
    pub fn persist(self, job_dir: &Path, pid: u32) -> Result<(), TrackerError> {
        if !job_dir.is_dir() {
            return Err(TrackerError::TargetMissing {
                path: job_dir.to_path_buf(),
            });
        }

        let path = self.path(job_dir);
        fs::write(&path, format!("{pid}\n")).map_err(|source| TrackerError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {pid} to {}", path.display());

        Ok(())
    }

    /// Read the tracked process ID, `None` if the file does not exist.
    pub fn read_pid(self, job_dir: &Path) -> Result<Option<u32>> {
        let path = self.path(job_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let pid = content
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Malformed tracking file {}", path.display()))?;
        Ok(Some(pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persist_then_read() {
        let job_dir = TempDir::new().unwrap();

        TrackingFile::Work.persist(job_dir.path(), 4821).unwrap();

        assert_eq!(
            fs::read_to_string(job_dir.path().join("run.pid")).unwrap(),
            "4821\n"
        );
        assert_eq!(
            TrackingFile::Work.read_pid(job_dir.path()).unwrap(),
            Some(4821)
        );
    }

    #[test]
    fn test_persist_is_idempotent() {
        let job_dir = TempDir::new().unwrap();
        let path = TrackingFile::Work.path(job_dir.path());

        TrackingFile::Work.persist(job_dir.path(), 4821).unwrap();
        let once = fs::read(&path).unwrap();
        TrackingFile::Work.persist(job_dir.path(), 4821).unwrap();
        let twice = fs::read(&path).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_persist_truncates_previous_content() {
        let job_dir = TempDir::new().unwrap();

        TrackingFile::Work.persist(job_dir.path(), 1234567).unwrap();
        TrackingFile::Work.persist(job_dir.path(), 42).unwrap();

        assert_eq!(
            fs::read_to_string(TrackingFile::Work.path(job_dir.path())).unwrap(),
            "42\n"
        );
    }

    #[test]
    fn test_work_and_launcher_files_are_separate() {
        let job_dir = TempDir::new().unwrap();

        TrackingFile::Launcher.persist(job_dir.path(), 4819).unwrap();
        TrackingFile::Work.persist(job_dir.path(), 4821).unwrap();

        assert_eq!(
            TrackingFile::Launcher.read_pid(job_dir.path()).unwrap(),
            Some(4819)
        );
        assert_eq!(
            TrackingFile::Work.read_pid(job_dir.path()).unwrap(),
            Some(4821)
        );
    }

    #[test]
    fn test_persist_missing_job_dir() {
        let temp_dir = TempDir::new().unwrap();
        let job_dir = temp_dir.path().join("run-20251111_050224");

        let err = TrackingFile::Work.persist(&job_dir, 4821).unwrap_err();

        assert!(matches!(err, TrackerError::TargetMissing { path } if path == job_dir));
        assert!(!job_dir.exists());
    }

    #[test]
    fn test_read_missing_tracking_file() {
        let job_dir = TempDir::new().unwrap();
        assert_eq!(TrackingFile::Work.read_pid(job_dir.path()).unwrap(), None);
    }

    #[test]
    fn test_read_malformed_tracking_file() {
        let job_dir = TempDir::new().unwrap();
        fs::write(TrackingFile::Work.path(job_dir.path()), "not-a-pid\n").unwrap();

        let err = TrackingFile::Work.read_pid(job_dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("Malformed tracking file"));
    }
}
