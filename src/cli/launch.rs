use super::{MessageFormat, job_matcher, jobs_root, print_json, show_banner};
use crate::config::BenchctlConfig;
use crate::continuation::ContinuationPolicy;
use crate::helpers::parse_duration;
use crate::launch::{LaunchContext, LaunchOptions, PidSource, RunnerCommand, launch};
use crate::prelude::*;
use crate::process_table::SysinfoProcessTable;
use crate::registry::{ImageRef, RegistryClient};
use clap::Args;

#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Do not wait for the images to be cached in the registry
    #[arg(long, default_value = "false")]
    pub skip_wait: bool,

    /// Do not check that the registry is reachable
    #[arg(long, default_value = "false")]
    pub skip_verify: bool,

    /// Launch even if the registry is unreachable, without asking
    #[arg(short = 'y', long, default_value = "false")]
    pub yes: bool,

    /// An image the run needs, e.g. `swebench/sweb.eval.x86_64.django_1776_django-11099:latest`.
    /// Can be repeated. The launch waits for each of them to be cached in the registry.
    #[arg(long = "image", value_name = "IMAGE")]
    pub images: Vec<String>,

    /// How long to let the runner start before looking for its process, overrides
    /// `runner.grace-period`. A bare number is read as seconds.
    #[arg(long, value_parser = parse_duration)]
    pub grace_period: Option<std::time::Duration>,

    #[arg(long, hide = true)]
    pub message_format: Option<MessageFormat>,

    /// Extra arguments passed to the runner
    #[arg(last = true)]
    pub runner_args: Vec<String>,
}

pub async fn run(args: LaunchArgs, config: &BenchctlConfig) -> Result<()> {
    show_banner();

    let jobs = jobs_root(config)?;
    let matcher = job_matcher(config)?;
    let runner = RunnerCommand::parse(&config.runner.command)?;
    let registry = RegistryClient::new(&config.registry.url, config.registry.timeout()?)?;
    let table = SysinfoProcessTable::new();

    let images = args
        .images
        .iter()
        .map(|image| image.parse::<ImageRef>())
        .collect::<Result<Vec<_>>>()?;
    let grace_period = match args.grace_period {
        Some(grace_period) => grace_period,
        None => config.runner.grace_period()?,
    };

    let ctx = LaunchContext {
        jobs: &jobs,
        matcher: &matcher,
        runner: &runner,
        registry: &registry,
        wait: config.registry.wait_settings()?,
        table: &table,
    };
    let options = LaunchOptions {
        skip_wait: args.skip_wait,
        skip_verify: args.skip_verify,
        images,
        grace_period,
        runner_args: args.runner_args,
    };
    let policy = ContinuationPolicy::from_cli(args.yes);

    let report = launch(&ctx, &options, &policy).await?;

    if args.message_format == Some(MessageFormat::Json) {
        return print_json(&report);
    }

    match report.source {
        PidSource::WorkProcess => info!(
            "Tracking process {} of job {}",
            report.tracked_pid,
            report.job_dir.display()
        ),
        PidSource::LauncherFallback => warn!(
            "Tracking launcher process {} of job {}",
            report.tracked_pid,
            report.job_dir.display()
        ),
    }
    info!(
        "Follow the run with `tail -f {}`",
        report.job_dir.join(crate::jobs::LOG_FILE_NAME).display()
    );

    Ok(())
}
