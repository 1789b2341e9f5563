mod check_registry;
mod launch;
mod locate;
mod ps;
mod repair;
mod shared;
mod status;
mod stop;

pub(crate) use shared::*;

use crate::{
    config::{BenchctlConfig, ConfigOverrides},
    local_logger::{BENCHCTL_U8_COLOR_CODE, init_local_logger},
    prelude::*,
};
use clap::{
    Parser, Subcommand,
    builder::{Styles, styling},
};

fn create_styles() -> Styles {
    styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(
            styling::Ansi256Color(BENCHCTL_U8_COLOR_CODE).on_default() | styling::Effects::BOLD,
        )
        .placeholder(styling::AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Launch, track and stop background benchmark runs",
    styles = create_styles()
)]
pub struct Cli {
    /// The configuration name to use
    /// If provided, the configuration will be loaded from ~/.config/benchctl/{config-name}.yaml
    /// Otherwise, loads from ~/.config/benchctl/config.yaml
    #[arg(long, env = "BENCHCTL_CONFIG_NAME", global = true)]
    pub config_name: Option<String>,

    /// The directory holding the job output directories, overrides `jobs.root`
    #[arg(long, env = "BENCHCTL_JOBS_ROOT", global = true)]
    pub jobs_root: Option<String>,

    /// The URL of the image registry, overrides `registry.url`
    #[arg(long, env = "BENCHCTL_REGISTRY_URL", global = true)]
    pub registry_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new benchmark run in the background and track its process
    #[command(alias = "l")]
    Launch(Box<launch::LaunchArgs>),
    /// Find the process doing the work of a job
    Locate(locate::LocateArgs),
    /// Rewrite stale tracking files of every job that has a running process
    Repair(repair::RepairArgs),
    /// List every running benchmark process with its resource usage
    Ps(ps::PsArgs),
    /// Show the tracked processes of a job
    Status(status::StatusArgs),
    /// Stop a job by signalling its tracked process
    Stop(stop::StopArgs),
    /// Check that the image registry is reachable
    CheckRegistry,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_local_logger()?;

    let overrides = ConfigOverrides {
        jobs_root: cli.jobs_root.clone(),
        registry_url: cli.registry_url.clone(),
    };
    let config = BenchctlConfig::load_with_override(cli.config_name.as_deref(), &overrides)?;

    match cli.command {
        Commands::Launch(args) => launch::run(*args, &config).await?,
        Commands::Locate(args) => locate::run(args, &config)?,
        Commands::Repair(args) => repair::run(args, &config)?,
        Commands::Ps(args) => ps::run(args, &config)?,
        Commands::Status(args) => status::run(args, &config)?,
        Commands::Stop(args) => stop::run(args, &config)?,
        Commands::CheckRegistry => check_registry::run(&config).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_launch() {
        let cli = Cli::try_parse_from([
            "benchctl",
            "--jobs-root",
            "/data/jobs",
            "launch",
            "--skip-wait",
            "--image",
            "swebench/a",
            "--image",
            "swebench/b:v2",
            "--",
            "--workers",
            "8",
        ])
        .unwrap();

        assert_eq!(cli.jobs_root.as_deref(), Some("/data/jobs"));
        let Commands::Launch(args) = cli.command else {
            panic!("expected the launch command");
        };
        assert!(args.skip_wait);
        assert!(!args.skip_verify);
        assert_eq!(args.images, vec!["swebench/a", "swebench/b:v2"]);
        assert_eq!(args.runner_args, vec!["--workers", "8"]);
    }

    #[test]
    fn test_parse_stop() {
        let cli = Cli::try_parse_from(["benchctl", "stop", "run-20251111_050224", "--force"])
            .unwrap();

        let Commands::Stop(args) = cli.command else {
            panic!("expected the stop command");
        };
        assert_eq!(args.job, "run-20251111_050224");
        assert!(args.force);
    }
}
