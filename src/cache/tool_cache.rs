//! Tool cache keyed by (tool, version, arch)
//!
//! Follows the directory layout of the hosted-runner tool cache. Entries
//! are not interchangeable with ones written by other setup actions: the
//! arch component is `x86_64`/`aarch64` rather than `x64`/`arm64`, and the
//! `.complete` marker carries JSON metadata, so empty markers are skipped.
//!
//! ```text
//! {root}/{tool}/{version}/{arch}/cs
//! {root}/{tool}/{version}/{arch}.complete
//! ```

use super::entry::{sha256_file, CacheEntry};
use crate::error::{SetupError, SetupResult};
use chrono::Utc;
use fs4::tokio::AsyncFileExt;
use semver::{Version, VersionReq};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

const MARKER_EXT: &str = "complete";
const LOCK_EXT: &str = "lock";
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// On-disk tool cache for one architecture
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
    arch: String,
}

/// Exclusive lock on one cache key, released on drop
#[derive(Debug)]
pub struct CacheLock {
    _file: fs::File,
    path: PathBuf,
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        debug!("Released tool cache lock {}", self.path.display());
    }
}

impl ToolCache {
    /// Create a cache rooted at `root` for the given architecture
    pub fn new(root: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            arch: arch.into(),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version)
    }

    fn entry_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version).join(&self.arch)
    }

    fn marker_path(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(format!("{}.{}", self.arch, MARKER_EXT))
    }

    fn lock_path(&self, tool: &str, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(format!("{}.{}", self.arch, LOCK_EXT))
    }

    fn is_complete(&self, tool: &str, version: &str) -> bool {
        self.marker_path(tool, version).is_file() && self.entry_dir(tool, version).is_dir()
    }

    /// Look up a tool by version spec.
    ///
    /// Exact versions (and specs that are not semver requirements) are looked
    /// up directly. A requirement such as `2.x` picks the highest cached
    /// version that satisfies it.
    pub fn find(&self, tool: &str, spec: &str) -> SetupResult<Option<PathBuf>> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Ok(None);
        }

        let version = if Version::parse(spec).is_ok() {
            spec.to_string()
        } else if let Some(req) = version_req(spec) {
            match self.best_match(tool, &req)? {
                Some(v) => v,
                None => {
                    debug!("No cached {} version matches {}", tool, spec);
                    return Ok(None);
                }
            }
        } else {
            spec.to_string()
        };

        if self.is_complete(tool, &version) {
            let dir = self.entry_dir(tool, &version);
            debug!("Found {} {} in tool cache at {}", tool, version, dir.display());
            Ok(Some(dir))
        } else {
            debug!("{} {} not in tool cache", tool, version);
            Ok(None)
        }
    }

    /// All completed versions of a tool for this architecture
    pub fn versions(&self, tool: &str) -> SetupResult<Vec<String>> {
        let tool_dir = self.root.join(tool);
        if !tool_dir.is_dir() {
            return Ok(vec![]);
        }

        let read = std::fs::read_dir(&tool_dir)
            .map_err(|e| SetupError::io(format!("reading {}", tool_dir.display()), e))?;

        let mut versions: Vec<String> = read
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|v| self.is_complete(tool, v))
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn best_match(&self, tool: &str, req: &VersionReq) -> SetupResult<Option<String>> {
        let best = self
            .versions(tool)?
            .into_iter()
            .filter_map(|v| Version::parse(&v).ok().map(|parsed| (parsed, v)))
            .filter(|(parsed, _)| req.matches(parsed))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, v)| v);
        Ok(best)
    }

    /// Every completed entry in the cache, across tools and architectures
    pub fn entries(&self) -> SetupResult<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        if !self.root.is_dir() {
            return Ok(entries);
        }

        for tool_dir in read_subdirs(&self.root)? {
            for version_dir in read_subdirs(&tool_dir)? {
                let markers = std::fs::read_dir(&version_dir)
                    .map_err(|e| SetupError::io(format!("reading {}", version_dir.display()), e))?;

                for marker in markers.filter_map(|e| e.ok()).map(|e| e.path()) {
                    if marker.extension().and_then(|e| e.to_str()) != Some(MARKER_EXT) {
                        continue;
                    }
                    match CacheEntry::load(&marker) {
                        Ok(entry) => entries.push(entry),
                        Err(e) => warn!("Skipping cache marker: {}", e),
                    }
                }
            }
        }

        entries.sort_by(|a, b| {
            (&a.tool, &a.version, &a.arch).cmp(&(&b.tool, &b.version, &b.arch))
        });
        Ok(entries)
    }

    /// Take the exclusive lock for a cache key.
    ///
    /// Waits until any other holder of the same key, in this process or
    /// another, releases it.
    pub async fn lock(&self, tool: &str, version: &str) -> SetupResult<CacheLock> {
        let path = self.lock_path(tool, version);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SetupError::io(format!("creating {}", parent.display()), e))?;
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .await
            .map_err(|e| SetupError::CacheLock {
                path: path.clone(),
                source: e,
            })?;

        let mut waiting = false;
        while !file.try_lock_exclusive().map_err(|e| SetupError::CacheLock {
            path: path.clone(),
            source: e,
        })? {
            if !waiting {
                info!("Waiting for tool cache lock {}", path.display());
                waiting = true;
            }
            tokio::time::sleep(LOCK_POLL_INTERVAL).await;
        }
        debug!("Acquired tool cache lock {}", path.display());

        Ok(CacheLock { _file: file, path })
    }

    /// Store a binary under (tool, version) and return its directory.
    ///
    /// If a completed entry already exists it is returned untouched. A
    /// directory left behind without a marker is replaced. The marker is
    /// written last, so a crash mid-copy never produces a visible entry.
    pub async fn cache_file(
        &self,
        source: &Path,
        binary_name: &str,
        tool: &str,
        version: &str,
        source_url: Option<&str>,
    ) -> SetupResult<PathBuf> {
        let dir = self.entry_dir(tool, version);
        if self.is_complete(tool, version) {
            debug!("{} {} already cached, keeping existing entry", tool, version);
            return Ok(dir);
        }

        if dir.exists() {
            warn!("Replacing incomplete cache entry {}", dir.display());
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| SetupError::io(format!("removing {}", dir.display()), e))?;
        }
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", dir.display()), e))?;

        let dest = dir.join(binary_name);
        fs::copy(source, &dest).await.map_err(|e| {
            SetupError::io(
                format!("copying {} to {}", source.display(), dest.display()),
                e,
            )
        })?;

        let hash_path = dest.clone();
        let sha256 = tokio::task::spawn_blocking(move || sha256_file(&hash_path))
            .await
            .map_err(|e| SetupError::Internal(format!("hash task failed: {e}")))??;

        let entry = CacheEntry {
            tool: tool.to_string(),
            version: version.to_string(),
            arch: self.arch.clone(),
            path: dir.clone(),
            binary: binary_name.to_string(),
            sha256,
            source_url: source_url.map(String::from),
            cached_at: Utc::now(),
        };

        let marker = self.marker_path(tool, version);
        let staging = marker.with_extension(format!("{}.tmp", MARKER_EXT));
        let content = serde_json::to_string_pretty(&entry)?;
        fs::write(&staging, content)
            .await
            .map_err(|e| SetupError::io(format!("writing {}", staging.display()), e))?;
        fs::rename(&staging, &marker)
            .await
            .map_err(|e| SetupError::io(format!("finalizing {}", marker.display()), e))?;

        info!("Cached {} {} at {}", tool, version, dir.display());
        Ok(dir)
    }
}

/// Parse a version requirement, reading a bare partial version such as
/// `2.1` as `2.1.x` instead of the caret default `^2.1`.
fn version_req(spec: &str) -> Option<VersionReq> {
    let bare = spec.starts_with(|c: char| c.is_ascii_digit())
        && !spec.contains(['*', 'x', 'X', ',', ' ']);
    if bare {
        VersionReq::parse(&format!("={spec}")).ok()
    } else {
        VersionReq::parse(spec).ok()
    }
}

fn read_subdirs(dir: &Path) -> SetupResult<Vec<PathBuf>> {
    let read = std::fs::read_dir(dir)
        .map_err(|e| SetupError::io(format!("reading {}", dir.display()), e))?;
    Ok(read
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect())
}
