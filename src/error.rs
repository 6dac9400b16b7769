//! Error types for setup-coursier
//!
//! All modules use `SetupResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for setup-coursier operations
pub type SetupResult<T> = Result<T, SetupError>;

/// All errors that can occur while installing Coursier, a JVM or apps
#[derive(Error, Debug)]
pub enum SetupError {
    // Platform errors
    #[error("Unsupported architecture: {0}. Coursier publishes binaries for x86_64 and aarch64.")]
    UnsupportedArch(String),

    #[error("Unsupported operating system: {0}. Coursier publishes binaries for Linux, macOS and Windows.")]
    UnsupportedOs(String),

    #[error("Invalid platform '{0}', expected <os>-<arch> (e.g. linux-x86_64)")]
    InvalidPlatform(String),

    // Download and extraction errors
    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to extract {path}: {reason}")]
    Extract { path: PathBuf, reason: String },

    #[error("Archive {archive} does not contain {member}")]
    ArchiveMemberNotFound { archive: PathBuf, member: String },

    // Cache errors
    #[error("Failed to lock tool cache entry {path}: {source}")]
    CacheLock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt tool cache marker {path}: {reason}")]
    CacheMarker { path: PathBuf, reason: String },

    // Process errors
    #[error("Failed to start command: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}, exit code: {}", describe_exit(.code))]
    CommandExit { command: String, code: Option<i32> },

    // Input errors
    #[error("Invalid cs-args: {0}")]
    InvalidArgs(String),

    #[error("Cannot determine the home directory for COURSIER_BIN_DIR")]
    HomeDirUnavailable,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration already exists at {0}")]
    ConfigExists(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl SetupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a download error
    pub fn download(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an extraction error
    pub fn extract(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Extract {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedArch(_) | Self::UnsupportedOs(_) => {
                Some("Run on a Linux, macOS or Windows runner with an x86_64 or aarch64 CPU")
            }
            Self::Download { .. } => {
                Some("Check the version input and network access to github.com")
            }
            Self::InvalidArgs(_) => Some("Quote cs-args the way you would in a shell"),
            Self::HomeDirUnavailable => Some("Set HOME before installing apps"),
            Self::CacheLock { .. } => Some("Check that RUNNER_TOOL_CACHE is writable"),
            Self::ConfigExists(_) => Some("Use --force to overwrite"),
            _ => None,
        }
    }
}
