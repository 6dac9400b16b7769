//! Downloading and caching the Coursier launcher
//!
//! [`resolve_coursier`] is the entry point: it returns a cached launcher when
//! one exists and otherwise downloads, unpacks and stores it.

pub mod extract;
pub mod fetch;

pub use fetch::{Fetcher, HttpFetcher};

use crate::cache::ToolCache;
use crate::error::{SetupError, SetupResult};
use crate::platform::{ArchiveKind, Platform};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Tool cache name of the Coursier launcher
pub const TOOL_NAME: &str = "cs";

/// Downloads and unpacks Coursier launchers into a scratch directory
pub struct Installer {
    fetcher: Arc<dyn Fetcher>,
    work_dir: PathBuf,
    base_url: String,
}

impl Installer {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        work_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            work_dir: work_dir.into(),
            base_url: base_url.into(),
        }
    }

    /// Release URL for a platform and version
    pub fn url_for(&self, platform: &Platform, version: &str) -> String {
        platform.download_url(&self.base_url, version)
    }

    /// Download the launcher and return the path of a ready-to-run binary.
    ///
    /// The archive is fetched under a random name, renamed to carry its
    /// extension, unpacked and marked executable.
    pub async fn download_coursier(
        &self,
        platform: &Platform,
        version: &str,
    ) -> SetupResult<PathBuf> {
        let url = self.url_for(platform, version);

        fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", self.work_dir.display()), e))?;

        let guid = self.work_dir.join(Uuid::new_v4().to_string());
        self.fetcher.fetch(&url, &guid).await?;

        let kind = platform.archive_kind();
        let archive = with_suffix(&guid, kind.extension());
        fs::rename(&guid, &archive)
            .await
            .map_err(|e| SetupError::io(format!("renaming {}", guid.display()), e))?;

        let binary = match kind {
            ArchiveKind::Gzip => blocking(move || extract::gunzip_in_place(&archive)).await?,
            ArchiveKind::Zip => {
                let member = platform.zip_member();
                let dest_dir = guid.clone();
                blocking(move || extract::unzip_member(&archive, &member, &dest_dir)).await?
            }
        };

        extract::make_executable(&binary)?;
        debug!("Unpacked Coursier launcher to {}", binary.display());
        Ok(binary)
    }
}

/// A launcher ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCoursier {
    /// Cache directory holding the binary, the directory added to PATH
    pub dir: PathBuf,

    /// Full path of the binary
    pub binary: PathBuf,

    /// Whether this call downloaded the launcher
    pub downloaded: bool,
}

/// Return the cached launcher for `version`, installing it on a miss.
///
/// The miss path holds the cache lock for the key and checks again once the
/// lock is held, so concurrent installers of the same version download once.
pub async fn resolve_coursier(
    cache: &ToolCache,
    installer: &Installer,
    platform: &Platform,
    version: &str,
) -> SetupResult<ResolvedCoursier> {
    let binary_name = platform.binary_name();

    if let Some(dir) = cache.find(TOOL_NAME, version)? {
        info!("Using cached Coursier {} from {}", version, dir.display());
        return Ok(ResolvedCoursier {
            binary: dir.join(binary_name),
            dir,
            downloaded: false,
        });
    }

    let _lock = cache.lock(TOOL_NAME, version).await?;
    if let Some(dir) = cache.find(TOOL_NAME, version)? {
        info!("Coursier {} was cached while waiting for the lock", version);
        return Ok(ResolvedCoursier {
            binary: dir.join(binary_name),
            dir,
            downloaded: false,
        });
    }

    let unpacked = installer.download_coursier(platform, version).await?;
    let url = installer.url_for(platform, version);
    let dir = cache
        .cache_file(&unpacked, binary_name, TOOL_NAME, version, Some(&url))
        .await?;

    Ok(ResolvedCoursier {
        binary: dir.join(binary_name),
        dir,
        downloaded: true,
    })
}

fn with_suffix(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

async fn blocking<T, F>(f: F) -> SetupResult<T>
where
    F: FnOnce() -> SetupResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SetupError::Internal(format!("extraction task failed: {e}")))?
}
