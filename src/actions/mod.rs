//! Publishing results to the surrounding CI job
//!
//! Every change a run makes to the job environment is an [`EnvMutation`].
//! Mutations are applied in order through an [`Environment`], which for
//! GitHub Actions means appending to the runner's file commands
//! (`GITHUB_PATH`, `GITHUB_ENV`, `GITHUB_OUTPUT`) so later steps see them,
//! and updating this process so children spawned now see them too.

pub mod commands;

pub use commands::Group;

use crate::error::{SetupError, SetupResult};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// A single change to the job environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMutation {
    /// Prepend a directory to PATH
    AddPath(PathBuf),
    /// Set an environment variable for this and later steps
    ExportVariable { name: String, value: String },
    /// Set a step output
    SetOutput { name: String, value: String },
}

impl EnvMutation {
    pub fn export(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ExportVariable {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn output(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SetOutput {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for EnvMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddPath(dir) => write!(f, "PATH += {}", dir.display()),
            Self::ExportVariable { name, value } => write!(f, "{}={}", name, value),
            Self::SetOutput { name, value } => write!(f, "output {}={}", name, value),
        }
    }
}

/// Destination for environment mutations
pub trait Environment {
    fn apply(&mut self, mutation: &EnvMutation) -> SetupResult<()>;
}

/// GitHub Actions file commands, plus the current process environment
#[derive(Debug, Clone)]
pub struct ActionsEnvironment {
    path_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    update_process: bool,
}

impl ActionsEnvironment {
    /// Use the file commands advertised by the runner, if any
    pub fn from_env() -> Self {
        let file = |var: &str| {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            path_file: file("GITHUB_PATH"),
            env_file: file("GITHUB_ENV"),
            output_file: file("GITHUB_OUTPUT"),
            update_process: true,
        }
    }

    /// Use explicit file command paths without touching this process
    pub fn with_files(
        path_file: Option<PathBuf>,
        env_file: Option<PathBuf>,
        output_file: Option<PathBuf>,
    ) -> Self {
        Self {
            path_file,
            env_file,
            output_file,
            update_process: false,
        }
    }

    /// Also apply PATH and variables to the current process
    pub fn update_process(mut self, update: bool) -> Self {
        self.update_process = update;
        self
    }

    fn prepend_process_path(dir: &Path) -> SetupResult<()> {
        let current = std::env::var_os("PATH").unwrap_or_default();
        let paths = std::iter::once(dir.to_path_buf()).chain(std::env::split_paths(&current));
        let joined = std::env::join_paths(paths).map_err(|e| {
            SetupError::io(
                format!("adding {} to PATH", dir.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            )
        })?;
        std::env::set_var("PATH", joined);
        Ok(())
    }
}

impl Environment for ActionsEnvironment {
    fn apply(&mut self, mutation: &EnvMutation) -> SetupResult<()> {
        debug!("Applying {}", mutation);

        match mutation {
            EnvMutation::AddPath(dir) => {
                match &self.path_file {
                    Some(file) => append_line(file, &dir.display().to_string())?,
                    None => info!("Added {} to PATH", dir.display()),
                }
                if self.update_process {
                    Self::prepend_process_path(dir)?;
                }
            }
            EnvMutation::ExportVariable { name, value } => {
                match &self.env_file {
                    Some(file) => append_line(file, &key_value_message(name, value)?)?,
                    None => info!("Exported {}={}", name, value),
                }
                if self.update_process {
                    std::env::set_var(name, value);
                }
            }
            EnvMutation::SetOutput { name, value } => match &self.output_file {
                Some(file) => append_line(file, &key_value_message(name, value)?)?,
                None => {
                    println!();
                    println!(
                        "::set-output name={}::{}",
                        commands::escape_data(name),
                        commands::escape_data(value)
                    );
                }
            },
        }

        Ok(())
    }
}

/// `name<<delimiter` block, safe for multi-line values
fn key_value_message(name: &str, value: &str) -> SetupResult<String> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(SetupError::Internal(format!(
            "value for {} contains the file command delimiter",
            name
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}"))
}

fn append_line(file: &Path, line: &str) -> SetupResult<()> {
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| SetupError::io(format!("opening {}", file.display()), e))?;
    writeln!(handle, "{}", line)
        .map_err(|e| SetupError::io(format!("writing {}", file.display()), e))
}
