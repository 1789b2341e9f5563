use std::{env, fs, path::PathBuf, time::Duration};

use crate::helpers::parse_duration;
use crate::prelude::*;
use crate::registry::WaitSettings;
use crate::tracker::MultiMatchPolicy;
use nestify::nest;
use serde::{Deserialize, Serialize};

nest! {
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]*
    #[serde(rename_all = "kebab-case", default)]*
    /// Persistent configuration of benchctl.
    ///
    /// Stored at `~/.config/benchctl/config.yaml`, or `{config-name}.yaml` next to it. Every
    /// field may be omitted and falls back to [`BenchctlConfig::default`].
    pub struct BenchctlConfig {
        pub jobs: pub struct JobsConfig {
            /// Directory holding one output directory per job, `~` is expanded
            pub root: String,
            /// Job directories are named `<prefix><YYYYmmdd_HHMMSS>`
            pub prefix: String,
        },
        pub runner: pub struct RunnerConfig {
            /// Shell-style command template, `{output}` is replaced by the job directory
            pub command: String,
            /// Substring identifying the runner program in a command line
            pub marker: String,
            /// Substrings identifying launcher processes that are not the work process
            pub wrapper_markers: Vec<String>,
            /// Regex whose first group extracts the job directory from a command line
            pub output_pattern: String,
            /// How long to let the runner start before looking for it
            pub grace_period: String,
            pub multi_match: MultiMatchPolicy,
        },
        pub registry: pub struct RegistryConfig {
            pub url: String,
            /// Timeout of a single registry request
            pub timeout: String,
            pub poll_interval: String,
            /// Ceiling on the whole wait for cached images
            pub max_wait: String,
        },
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            root: "~/jobs".to_string(),
            prefix: "run-".to_string(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command:
                "conda run -n swebench python -m minisweagent.run.extra.swebench --output {output}"
                    .to_string(),
            marker: "minisweagent.run".to_string(),
            wrapper_markers: vec!["bin/conda run".to_string(), "sh -c ".to_string()],
            output_pattern: r"--output[= ](\S+)".to_string(),
            grace_period: "5s".to_string(),
            multi_match: MultiMatchPolicy::First,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout: "5s".to_string(),
            poll_interval: "10s".to_string(),
            max_wait: "30m".to_string(),
        }
    }
}

impl Default for BenchctlConfig {
    fn default() -> Self {
        Self {
            jobs: JobsConfig::default(),
            runner: RunnerConfig::default(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub jobs_root: Option<String>,
    pub registry_url: Option<String>,
}

/// Get the path to the configuration file, following the XDG Base Directory Specification
/// at https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html
fn get_configuration_file_path(config_name: Option<&str>) -> Result<PathBuf> {
    let config_dir = match env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = env::var("HOME").context("HOME env variable not set")?;
            PathBuf::from(home).join(".config")
        }
    };
    let config_dir = config_dir.join("benchctl");

    Ok(match config_name {
        Some(name) => config_dir.join(format!("{name}.yaml")),
        None => config_dir.join("config.yaml"),
    })
}

impl BenchctlConfig {
    /// Load the configuration. If it does not exist, return a default configuration.
    pub fn load_with_override(
        config_name: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let config_path = get_configuration_file_path(config_name)?;

        let mut config = match fs::read(&config_path) {
            Ok(config_str) => {
                let config: BenchctlConfig =
                    serde_yaml::from_slice(&config_str).with_context(|| {
                        format!("Failed to parse benchctl config at {}", config_path.display())
                    })?;
                debug!("Config loaded from {}", config_path.display());
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config file not found at {}", config_path.display());
                BenchctlConfig::default()
            }
            Err(e) => bail!("Failed to load config: {e}"),
        };

        if let Some(jobs_root) = &overrides.jobs_root {
            config.jobs.root = jobs_root.clone();
        }
        if let Some(registry_url) = &overrides.registry_url {
            config.registry.url = registry_url.clone();
        }

        Ok(config)
    }
}

impl JobsConfig {
    pub fn root_path(&self) -> PathBuf {
        // A `~` may reach us unexpanded from a config file or a quoted argument
        PathBuf::from(shellexpand::tilde(&self.root).as_ref())
    }
}

impl RunnerConfig {
    pub fn grace_period(&self) -> Result<Duration> {
        parse_duration(&self.grace_period).context("Invalid runner.grace-period")
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(&self.timeout).context("Invalid registry.timeout")
    }

    pub fn wait_settings(&self) -> Result<WaitSettings> {
        Ok(WaitSettings {
            poll_interval: parse_duration(&self.poll_interval)
                .context("Invalid registry.poll-interval")?,
            max_wait: parse_duration(&self.max_wait).context("Invalid registry.max-wait")?,
        })
    }
}
