//! Concurrent download of missing platform binaries.

use futures_util::future::join_all;
use log::{debug, info, warn};
use rand::Rng;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::{Result, SolcError};
use crate::runtime::Runtime;
use crate::solc::Solc;

use super::{Asset, Release, normalize_tag};

/// Random wait before each download request, in milliseconds. Spreads a
/// round of parallel requests so GitHub does not answer with 503s.
pub const DOWNLOAD_JITTER_MS: RangeInclusive<u64> = 500..=1500;

/// How often a running round logs its progress.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

const BINARY_MODE: u32 = 0o755;

/// One missing binary to fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTask {
    /// Normalized version tag
    pub version: String,
    pub asset: Asset,
    pub destination: PathBuf,
}

impl<R: Runtime> Solc<R> {
    /// Work out which binaries of `releases` are missing on disk.
    ///
    /// Releases without a build for this platform are skipped, as are
    /// binaries that already exist. A `version_filter` (prefix-insensitive)
    /// narrows the scan to one release; `None` or `""` means all.
    pub fn plan_downloads(
        &self,
        releases: &[Release],
        version_filter: Option<&str>,
    ) -> Vec<DownloadTask> {
        let distribution = self.distribution();
        let filter = version_filter.map(normalize_tag).filter(|v| !v.is_empty());
        let mut seen = HashSet::new();

        releases
            .iter()
            .filter(|release| filter.is_none_or(|wanted| release.version() == wanted))
            .filter_map(|release| {
                let Some(asset) = distribution.pick_asset(release) else {
                    debug!(
                        "No {} build in release {}, skipping",
                        distribution.asset_token(),
                        release.tag_name
                    );
                    return None;
                };

                let destination = self
                    .config
                    .releases_dir()
                    .join(distribution.binary_file_name(&release.tag_name));

                if self.runtime.exists(&destination) || !seen.insert(destination.clone()) {
                    return None;
                }

                Some(DownloadTask {
                    version: release.version().to_string(),
                    asset: asset.clone(),
                    destination,
                })
            })
            .collect()
    }

    /// Download every missing binary of `releases` concurrently.
    ///
    /// All downloads run to completion even when some fail; the first error
    /// observed is returned. Downloads that have not sent their request yet
    /// when the cancellation token fires report [`SolcError::Cancelled`].
    #[tracing::instrument(skip(self, releases))]
    pub async fn sync_binaries(
        &self,
        releases: &[Release],
        version_filter: Option<&str>,
    ) -> Result<()> {
        let tasks = self.plan_downloads(releases, version_filter);
        let total = tasks.len();

        if tasks.is_empty() {
            debug!("All solc binaries are present");
            return Ok(());
        }

        for task in &tasks {
            info!(
                "Downloading missing solc release {} ({} -> {:?})",
                task.version,
                task.asset.name,
                task.destination.file_name().unwrap_or_default()
            );
        }

        let completed = AtomicUsize::new(0);
        let (errors_tx, mut errors_rx) = mpsc::unbounded_channel();

        let downloads = join_all(tasks.iter().map(|task| {
            let errors_tx = errors_tx.clone();
            let completed = &completed;
            async move {
                if let Err(e) = self.download_binary(task).await {
                    match e {
                        SolcError::Cancelled { .. } => debug!("{}", e),
                        _ => warn!("Failed to download solc {}: {}", task.version, e),
                    }
                    let _ = errors_tx.send(e);
                }
                completed.fetch_add(1, Ordering::SeqCst);
            }
        }));
        drop(errors_tx);
        tokio::pin!(downloads);

        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut downloads => break,
                _ = ticker.tick() => {
                    debug!(
                        "Downloaded {} out of {} binaries",
                        completed.load(Ordering::SeqCst),
                        total
                    );
                }
            }
        }

        match errors_rx.try_recv() {
            Ok(first_error) => Err(first_error),
            Err(_) => {
                info!("Downloaded {} solc binaries", total);
                Ok(())
            }
        }
    }

    async fn download_binary(&self, task: &DownloadTask) -> Result<()> {
        let cancelled = || SolcError::Cancelled {
            version: task.version.clone(),
        };

        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }

        let delay = Duration::from_millis(rand::rng().random_range(DOWNLOAD_JITTER_MS));
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(cancelled()),
            _ = tokio::time::sleep(delay) => {}
        }

        let partial = partial_path(&task.destination);
        let downloaded = self
            .http_client
            .download_file(&task.asset.browser_download_url, || {
                self.runtime
                    .create_file(&partial)
                    .map_err(|e| SolcError::io(format!("Failed to create {:?}", partial), e))
            })
            .await;

        let stored = downloaded
            .and_then(|_| {
                self.runtime
                    .set_permissions(&partial, BINARY_MODE)
                    .map_err(|e| SolcError::io(format!("Failed to set {:?} as executable", partial), e))
            })
            .and_then(|_| {
                self.runtime.rename(&partial, &task.destination).map_err(|e| {
                    SolcError::io(format!("Failed to move {:?} into place", partial), e)
                })
            });

        if let Err(e) = stored {
            if self.runtime.exists(&partial) {
                let _ = self.runtime.remove_file(&partial);
            }
            return Err(e);
        }

        debug!("Stored solc {} at {:?}", task.version, task.destination);
        Ok(())
    }
}

/// `solc-0.8.20` -> `solc-0.8.20.part`
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}
