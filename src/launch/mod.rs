//! Starting a new benchmark run in the background.

use crate::continuation::ContinuationPolicy;
use crate::error::TrackerError;
use crate::jobs::{JobsRoot, LOG_FILE_NAME, TrackingFile};
use crate::prelude::*;
use crate::process_table::ProcessTable;
use crate::registry::{ImageRef, RegistryClient, WaitSettings, wait_for_images};
use crate::tracker::JobMatcher;
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

mod spawn;

pub use spawn::RunnerCommand;

/// Everything `launch` needs from the environment.
pub struct LaunchContext<'a> {
    pub jobs: &'a JobsRoot,
    pub matcher: &'a JobMatcher,
    pub runner: &'a RunnerCommand,
    pub registry: &'a RegistryClient,
    pub wait: WaitSettings,
    pub table: &'a dyn ProcessTable,
}

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Do not wait for the images to be cached
    pub skip_wait: bool,
    /// Do not check that the registry is alive
    pub skip_verify: bool,
    pub images: Vec<ImageRef>,
    pub grace_period: Duration,
    /// Appended to the runner command
    pub runner_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PidSource {
    /// The work process was found in the process table
    WorkProcess,
    /// The work process could not be found, the spawned launcher is tracked instead
    LauncherFallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReport {
    pub job_dir: PathBuf,
    pub launcher_pid: u32,
    pub tracked_pid: u32,
    pub source: PidSource,
}

async fn verify_registry(registry: &RegistryClient, policy: &ContinuationPolicy) -> Result<()> {
    start_group!("Verifying the image registry");
    let alive = registry.check_alive().await;
    end_group!();

    match alive {
        Ok(()) => {
            info!("Registry at {} is reachable", registry.base_url());
            Ok(())
        }
        Err(err) => {
            warn!("{err}");
            if policy.should_continue("The image registry is unreachable. Launch anyway?") {
                Ok(())
            } else {
                bail!("Launch aborted: {err}")
            }
        }
    }
}

async fn wait_for_cache(
    ctx: &LaunchContext<'_>,
    images: &[ImageRef],
    policy: &ContinuationPolicy,
) -> Result<()> {
    start_group!(format!("Waiting for {} images to be cached", images.len()));
    let cached = wait_for_images(ctx.registry, images, &ctx.wait).await;
    end_group!();

    match cached {
        Ok(()) => info!("All {} images are cached", images.len()),
        Err(err @ TrackerError::RegistryUnreachable { .. }) => {
            warn!("{err}");
            if !policy.should_continue("The image registry is unreachable. Launch anyway?") {
                bail!("Launch aborted: {err}");
            }
        }
        Err(err) => warn!("{err}. Launching anyway, missing images will be pulled at runtime"),
    }
    Ok(())
}

/// Start a new job: check the registry, create the job directory, spawn the runner and record
/// which process to track.
///
/// The launcher's own ID is captured at spawn time. The work process is then looked up among the
/// other processes after the grace period; if it cannot be found the launcher ID is tracked
/// instead and reported as a fallback. Nothing blocks beyond the grace period and the bounded
/// image wait.
pub async fn launch(
    ctx: &LaunchContext<'_>,
    options: &LaunchOptions,
    policy: &ContinuationPolicy,
) -> Result<LaunchReport> {
    if options.skip_verify {
        info!("Skipping the registry verification");
    } else {
        verify_registry(ctx.registry, policy).await?;
    }

    if options.skip_wait {
        info!("Skipping the wait for cached images");
    } else if options.images.is_empty() {
        debug!("No images to wait for");
    } else {
        wait_for_cache(ctx, &options.images, policy).await?;
    }

    let job_dir = ctx.jobs.create_job_dir(Local::now().naive_local())?;
    let job_path = job_dir.to_string_lossy().into_owned();

    let launcher_pid = ctx.runner.spawn_detached(
        &job_dir,
        &options.runner_args,
        &job_dir.join(LOG_FILE_NAME),
    )?;
    TrackingFile::Launcher.persist(&job_dir, launcher_pid)?;
    info!("Started job {job_path} (launcher process {launcher_pid})");

    if !options.grace_period.is_zero() {
        start_group!("Waiting for the runner to start");
        tokio::time::sleep(options.grace_period).await;
        end_group!();
    }

    // The launcher may carry the marker and the job path too, it is never the work process
    let mut records = ctx.table.snapshot()?;
    records.retain(|record| record.pid != launcher_pid);
    let (tracked_pid, source) = match ctx.matcher.locate(&records, &job_path) {
        Ok(pid) => (pid, PidSource::WorkProcess),
        Err(err) => {
            warn!("{err}");
            warn!(
                "Tracking the launcher process {launcher_pid} instead, run `benchctl repair` once the runner is up"
            );
            (launcher_pid, PidSource::LauncherFallback)
        }
    };
    TrackingFile::Work.persist(&job_dir, tracked_pid)?;

    Ok(LaunchReport {
        job_dir,
        launcher_pid,
        tracked_pid,
        source,
    })
}
