use crate::prelude::*;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// The runner invocation, parsed from a shell-style template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    program: String,
    args: Vec<String>,
}

impl RunnerCommand {
    pub fn parse(template: &str) -> Result<Self> {
        let mut words = shell_words::split(template)
            .with_context(|| format!("Invalid runner command '{template}'"))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| anyhow!("The runner command must not be empty"))?;

        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Arguments for a job writing to `job_dir`, followed by `extra_args`.
    ///
    /// Without an `{output}` placeholder in the template, `--output <job_dir>` is appended.
    pub fn args_for(&self, job_dir: &Path, extra_args: &[String]) -> Vec<String> {
        let job_dir = job_dir.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &job_dir))
            .collect();
        if !self.args.iter().any(|arg| arg.contains(OUTPUT_PLACEHOLDER)) {
            args.push("--output".to_string());
            args.push(job_dir.into_owned());
        }
        args.extend(extra_args.iter().cloned());
        args
    }

    pub fn command_line(&self, job_dir: &Path, extra_args: &[String]) -> String {
        shell_words::join(
            std::iter::once(self.program.clone()).chain(self.args_for(job_dir, extra_args)),
        )
    }

    /// Start the runner in the background and return the spawned process' ID.
    ///
    /// Output goes to `log_path`, stdin is closed and the child gets its own process group so
    /// that terminal signals aimed at benchctl do not reach it.
    pub fn spawn_detached(
        &self,
        job_dir: &Path,
        extra_args: &[String],
        log_path: &Path,
    ) -> Result<u32> {
        let stdout = File::create(log_path)
            .with_context(|| format!("Failed to create {}", log_path.display()))?;
        let stderr = stdout.try_clone()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(job_dir, extra_args))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        debug!("Spawning {}", self.command_line(job_dir, extra_args));
        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn the runner '{}'", self.program))?;

        Ok(child.id())
    }
}
