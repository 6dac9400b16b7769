//! Running the installed launcher
//!
//! Commands are awaited to completion. Stdout is echoed to the job log and
//! captured, stderr goes straight through.

use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStdout, Command};
use tracing::debug;

/// Executes external commands and returns their trimmed stdout
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, adding `envs` to the child environment.
    ///
    /// A non-zero exit is an error.
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> SetupResult<String>;
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Drop empty arguments
pub fn filter_args(args: &[String]) -> Vec<&str> {
    args.iter()
        .map(String::as_str)
        .filter(|a| !a.is_empty())
        .collect()
}

fn display_command(program: &Path, args: &[&str]) -> String {
    std::iter::once(program.display().to_string())
        .chain(args.iter().map(|a| a.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        envs: &[(String, String)],
    ) -> SetupResult<String> {
        let args = filter_args(args);
        let command = display_command(program, &args);
        println!("[command]{}", command);

        let mut child = Command::new(program)
            .args(&args)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SetupError::command_failed(command.clone(), e))?;

        let captured = match child.stdout.take() {
            Some(stdout) => echo_lines(stdout).await,
            None => Ok(Vec::new()),
        };

        // Reap the child even when reading its output failed
        let status = child
            .wait()
            .await
            .map_err(|e| SetupError::command_failed(command.clone(), e))?;
        debug!("{} exited with {}", command, status);

        let captured =
            captured.map_err(|e| SetupError::io(format!("reading output of {}", command), e))?;

        if !status.success() {
            return Err(SetupError::CommandExit {
                command,
                code: status.code(),
            });
        }

        let output = String::from_utf8_lossy(&captured);
        Ok(output.trim().to_string())
    }
}

/// Echo each line of `stdout` as it arrives and return everything read.
///
/// Output is decoded lossily, so bytes that are not UTF-8 never fail a run.
async fn echo_lines(stdout: ChildStdout) -> std::io::Result<Vec<u8>> {
    let mut reader = BufReader::new(stdout);
    let mut captured = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        println!("{}", text.trim_end_matches(['\r', '\n']));
        captured.extend_from_slice(&line);
    }

    Ok(captured)
}

/// Handle on an installed Coursier launcher
#[derive(Clone)]
pub struct Coursier {
    binary: PathBuf,
    extra_args: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl Coursier {
    /// Create a handle; `extra_args` are prepended to every invocation
    pub fn new(
        binary: impl Into<PathBuf>,
        extra_args: Vec<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            binary: binary.into(),
            extra_args,
            runner,
        }
    }

    /// Split a `cs-args` value using shell quoting rules
    pub fn parse_extra_args(raw: &str) -> SetupResult<Vec<String>> {
        shlex::split(raw).ok_or_else(|| SetupError::InvalidArgs(raw.to_string()))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run `cs <extra args> <args>`
    pub async fn run(&self, args: &[&str]) -> SetupResult<String> {
        self.run_with_env(args, &[]).await
    }

    /// Run `cs <extra args> <args>` with additional child environment
    pub async fn run_with_env(
        &self,
        args: &[&str],
        envs: &[(String, String)],
    ) -> SetupResult<String> {
        let full: Vec<String> = self
            .extra_args
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect();
        self.runner.run(&self.binary, &full, envs).await
    }
}
