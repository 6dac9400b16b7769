//! Platform detection and Coursier release asset naming
//!
//! Maps the running OS and CPU to the asset published on the Coursier
//! GitHub releases page, e.g. `cs-x86_64-pc-linux.gz`.

use crate::error::{SetupError, SetupResult};
use std::fmt;
use std::str::FromStr;

/// Release hosting base URL for Coursier binaries
pub const DEFAULT_BASE_URL: &str = "https://github.com/coursier/coursier/releases/download";

/// Coursier release installed when no version is requested
pub const DEFAULT_VERSION: &str = "2.1.0-M7-39-gb8f3d7532";

/// Supported CPU architecture families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
}

impl Arch {
    /// Parse an architecture name as reported by Rust or Node-style runners
    pub fn from_name(name: &str) -> SetupResult<Self> {
        match name {
            "x86_64" | "x64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" | "arm" => Ok(Self::Aarch64),
            other => Err(SetupError::UnsupportedArch(other.to_string())),
        }
    }

    /// Name used in Coursier asset names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    /// Parse an OS name as reported by Rust or Node-style runners
    pub fn from_name(name: &str) -> SetupResult<Self> {
        match name {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" | "win32" => Ok(Self::Windows),
            other => Err(SetupError::UnsupportedOs(other.to_string())),
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
        }
    }
}

/// Archive format of a release asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Gzip,
    Zip,
}

impl ArchiveKind {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zip => "zip",
        }
    }
}

/// Resolved (OS, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Resolve a platform from raw names.
    ///
    /// The architecture is checked first so an unsupported CPU fails before
    /// anything else is looked at.
    pub fn resolve(os: &str, arch: &str) -> SetupResult<Self> {
        let arch = Arch::from_name(arch)?;
        let os = Os::from_name(os)?;
        Ok(Self { os, arch })
    }

    /// Detect the platform this binary runs on
    pub fn current() -> SetupResult<Self> {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Target triple suffix used by Coursier release assets
    pub fn suffix(&self) -> &'static str {
        match self.os {
            Os::Linux => "pc-linux",
            Os::MacOs => "apple-darwin",
            Os::Windows => "pc-win32",
        }
    }

    pub fn archive_kind(&self) -> ArchiveKind {
        match self.os {
            Os::Windows => ArchiveKind::Zip,
            Os::Linux | Os::MacOs => ArchiveKind::Gzip,
        }
    }

    /// Release asset file name, e.g. `cs-aarch64-apple-darwin.gz`
    pub fn asset_name(&self) -> String {
        format!(
            "cs-{}-{}.{}",
            self.arch.as_str(),
            self.suffix(),
            self.archive_kind().extension()
        )
    }

    /// Full download URL for a release version
    pub fn download_url(&self, base_url: &str, version: &str) -> String {
        format!(
            "{}/v{}/{}",
            base_url.trim_end_matches('/'),
            version,
            self.asset_name()
        )
    }

    /// Executable stored inside the Windows zip archive
    pub fn zip_member(&self) -> String {
        format!("cs-{}-pc-win32.exe", self.arch.as_str())
    }

    /// File name of the binary once placed in the tool cache
    pub fn binary_name(&self) -> &'static str {
        match self.os {
            Os::Windows => "cs.exe",
            Os::Linux | Os::MacOs => "cs",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.name(), self.arch.as_str())
    }
}

impl FromStr for Platform {
    type Err = SetupError;

    /// Parse `<os>-<arch>`, e.g. `linux-x86_64` or `darwin-arm64`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once('-')
            .ok_or_else(|| SetupError::InvalidPlatform(s.to_string()))?;
        Self::resolve(os, arch)
    }
}
