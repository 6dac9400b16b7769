//! Fetching release assets over HTTP

use crate::error::{SetupError, SetupResult};
use crate::ui::{DownloadProgress, UiContext};
use async_trait::async_trait;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("setup-coursier/", env!("CARGO_PKG_VERSION"));

/// Downloads a URL to a local file
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, returning the number of bytes written
    async fn fetch(&self, url: &str, dest: &Path) -> SetupResult<u64>;
}

/// Blocking `ureq` client run on the blocking thread pool
pub struct HttpFetcher {
    ctx: UiContext,
}

impl HttpFetcher {
    pub fn new(ctx: UiContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> SetupResult<u64> {
        info!("Downloading {}", url);

        let url = url.to_string();
        let dest = dest.to_path_buf();
        let ctx = self.ctx.clone();

        tokio::task::spawn_blocking(move || download_blocking(&ctx, &url, &dest))
            .await
            .map_err(|e| SetupError::Internal(format!("download task failed: {e}")))?
    }
}

fn download_blocking(ctx: &UiContext, url: &str, dest: &Path) -> SetupResult<u64> {
    let response = ureq::get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| SetupError::download(url, e.to_string()))?;

    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    debug!("Response {} for {}, length {:?}", response.status(), url, total);

    let label = url.rsplit('/').next().unwrap_or(url);
    let progress = DownloadProgress::new(ctx, label, total);

    let mut reader = progress.wrap_read(response.into_body().into_reader());
    let mut file = File::create(dest)
        .map_err(|e| SetupError::io(format!("creating {}", dest.display()), e))?;
    let bytes = std::io::copy(&mut reader, &mut file)
        .map_err(|e| SetupError::download(url, e.to_string()))?;
    file.sync_all()
        .map_err(|e| SetupError::io(format!("flushing {}", dest.display()), e))?;

    progress.finish(bytes);
    Ok(bytes)
}
