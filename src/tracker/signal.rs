use crate::jobs::TrackingFile;
use crate::prelude::*;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Signalled { pid: u32, signal: Signal },
    /// The tracked process had already exited
    AlreadyGone { pid: u32 },
}

fn to_nix_pid(pid: u32) -> Result<Pid> {
    let raw = i32::try_from(pid).with_context(|| format!("Invalid process ID {pid}"))?;
    ensure!(raw > 0, "Invalid process ID {pid}");
    Ok(Pid::from_raw(raw))
}

/// Whether a process with this ID currently exists.
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = to_nix_pid(pid) else {
        return false;
    };

    match kill(pid, None) {
        Ok(()) => true,
        // The process exists but belongs to someone else
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Signal the process recorded in the job's tracking file.
///
/// A process that no longer exists is a normal outcome, not an error.
pub fn stop_job(job_dir: &Path, force: bool) -> Result<StopOutcome> {
    let pid = TrackingFile::Work.read_pid(job_dir)?.ok_or_else(|| {
        anyhow!(
            "No tracking file found at {}",
            TrackingFile::Work.path(job_dir).display()
        )
    })?;
    let signal = if force {
        Signal::SIGKILL
    } else {
        Signal::SIGTERM
    };

    match kill(to_nix_pid(pid)?, signal) {
        Ok(()) => Ok(StopOutcome::Signalled { pid, signal }),
        Err(Errno::ESRCH) => Ok(StopOutcome::AlreadyGone { pid }),
        Err(errno) => {
            Err(errno).with_context(|| format!("Failed to send {signal} to process {pid}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;
    use tempfile::TempDir;

    #[test]
    fn test_stop_running_process() {
        let job_dir = TempDir::new().unwrap();
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        TrackingFile::Work.persist(job_dir.path(), child.id()).unwrap();
        assert!(is_alive(child.id()));

        let outcome = stop_job(job_dir.path(), false).unwrap();

        assert_eq!(
            outcome,
            StopOutcome::Signalled {
                pid: child.id(),
                signal: Signal::SIGTERM
            }
        );
        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    }

    #[test]
    fn test_force_stop_sends_sigkill() {
        let job_dir = TempDir::new().unwrap();
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        TrackingFile::Work.persist(job_dir.path(), child.id()).unwrap();

        stop_job(job_dir.path(), true).unwrap();

        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
    }

    #[test]
    fn test_stop_exited_process() {
        let job_dir = TempDir::new().unwrap();
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        TrackingFile::Work.persist(job_dir.path(), pid).unwrap();

        let outcome = stop_job(job_dir.path(), false).unwrap();

        assert_eq!(outcome, StopOutcome::AlreadyGone { pid });
        assert!(!is_alive(pid));
    }

    #[test]
    fn test_stop_without_tracking_file() {
        let job_dir = TempDir::new().unwrap();
        assert!(stop_job(job_dir.path(), false).is_err());
    }

    #[test]
    fn test_invalid_pid_is_not_alive() {
        assert!(!is_alive(0));
        assert!(!is_alive(u32::MAX));
    }
}
