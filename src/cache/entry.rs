//! Completion marker for a tool cache entry

use crate::error::{SetupError, SetupResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Contents of `{tool}/{version}/{arch}.complete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Tool name, e.g. `cs`
    pub tool: String,

    /// Version the entry was stored under
    pub version: String,

    /// Architecture component of the cache key
    pub arch: String,

    /// Directory holding the binary
    pub path: PathBuf,

    /// File name of the binary inside `path`
    pub binary: String,

    /// SHA256 of the binary at store time
    pub sha256: String,

    /// Where the binary was downloaded from, when known
    pub source_url: Option<String>,

    /// When the entry was finalized
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Full path of the cached binary
    pub fn binary_path(&self) -> PathBuf {
        self.path.join(&self.binary)
    }

    /// Read a marker file
    pub fn load(marker: &Path) -> SetupResult<Self> {
        let content = std::fs::read_to_string(marker)
            .map_err(|e| SetupError::io(format!("reading {}", marker.display()), e))?;

        serde_json::from_str(&content).map_err(|e| SetupError::CacheMarker {
            path: marker.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Hex-encoded SHA256 of a file, read in chunks
pub fn sha256_file(path: &Path) -> SetupResult<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| SetupError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let n = file
            .read(&mut buffer)
            .map_err(|e| SetupError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
