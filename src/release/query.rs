//! Lookups over the in-memory mirror or the persisted cache.

use log::debug;
use std::path::PathBuf;

use crate::error::{Result, SolcError};
use crate::runtime::Runtime;
use crate::solc::Solc;

use super::{Release, VersionInfo, normalize_tag};

impl<R: Runtime> Solc<R> {
    /// Read the persisted cache and refresh the mirror with it.
    pub fn get_local_releases(&self) -> Result<Vec<Release>> {
        let releases = self.store().load()?;
        self.set_mirror(releases.clone());
        Ok(releases)
    }

    /// The in-memory mirror as is. `None` until a sync or a cache read.
    pub fn get_cached_releases(&self) -> Option<Vec<Release>> {
        self.mirror()
    }

    /// Mirror when populated, else the persisted cache, else a fresh sync.
    async fn authoritative_releases(&self) -> Result<Vec<Release>> {
        if let Some(releases) = self.mirror()
            && !releases.is_empty()
        {
            return Ok(releases);
        }

        match self.get_local_releases() {
            Err(SolcError::CacheMissing { path }) => {
                debug!("No release cache at {:?}, syncing releases", path);
                self.sync_releases().await
            }
            other => other,
        }
    }

    /// The newest release: element 0 of the remote order.
    #[tracing::instrument(skip(self))]
    pub async fn get_latest_release(&self) -> Result<Release> {
        self.authoritative_releases()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SolcError::Empty {
                path: self.local_releases_path(),
            })
    }

    /// Find a release by tag; `v0.8.20` and `0.8.20` are the same release.
    #[tracing::instrument(skip(self))]
    pub async fn get_release(&self, tag: &str) -> Result<Release> {
        let wanted = normalize_tag(tag);
        let releases = self.authoritative_releases().await?;

        if releases.is_empty() {
            return Err(SolcError::Empty {
                path: self.local_releases_path(),
            });
        }

        releases
            .into_iter()
            .find(|release| release.version() == wanted)
            .ok_or_else(|| SolcError::ReleaseNotFound {
                tag: wanted.to_string(),
            })
    }

    /// Re-read the cache and project every release, the first one being
    /// marked as latest.
    pub fn get_releases_simplified(&self) -> Result<Vec<VersionInfo>> {
        let releases = self.get_local_releases()?;
        let Some(latest) = releases.first() else {
            return Ok(Vec::new());
        };

        Ok(releases
            .iter()
            .map(|release| release.version_info(&latest.tag_name))
            .collect())
    }

    /// Path of the downloaded binary for `version`.
    #[tracing::instrument(skip(self))]
    pub async fn get_binary(&self, version: &str) -> Result<PathBuf> {
        let version = normalize_tag(version);
        self.get_release(version).await?;

        let path = self.binary_path(version);
        if !self.runtime.exists(&path) {
            return Err(SolcError::BinaryNotFound {
                version: version.to_string(),
                path,
            });
        }

        Ok(path)
    }

    /// Delete the downloaded binary for `version`.
    #[tracing::instrument(skip(self))]
    pub async fn remove_binary(&self, version: &str) -> Result<()> {
        let path = self.get_binary(version).await?;

        self.runtime
            .remove_file(&path)
            .map_err(|e| SolcError::io(format!("Failed to remove {:?}", path), e))?;

        debug!("Removed solc binary {:?}", path);
        Ok(())
    }
}
