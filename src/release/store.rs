//! Persisted release cache.

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{Result, SolcError};
use crate::runtime::Runtime;

use super::Release;

pub const RELEASES_FILE_NAME: &str = "releases.json";

/// The `releases.json` file under a releases directory.
pub struct ReleaseStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> ReleaseStore<'a, R> {
    pub fn new(runtime: &'a R, releases_dir: &Path) -> Self {
        Self {
            runtime,
            path: releases_dir.join(RELEASES_FILE_NAME),
        }
    }

    /// Returns: `<releases_dir>/releases.json`
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.runtime.exists(&self.path)
    }

    /// Read and decode the cache file.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<Vec<Release>> {
        if !self.runtime.exists(&self.path) {
            return Err(SolcError::CacheMissing {
                path: self.path.clone(),
            });
        }

        let content = self.runtime.read_to_string(&self.path).map_err(|e| {
            SolcError::io(format!("Failed to read release cache {:?}", self.path), e)
        })?;

        let releases: Vec<Release> =
            serde_json::from_str(&content).map_err(|source| SolcError::Decode {
                what: format!("release cache {:?}", self.path),
                source,
            })?;

        debug!("Loaded {} releases from {:?}", releases.len(), self.path);
        Ok(releases)
    }

    /// Replace the cache file with `releases`.
    ///
    /// The content goes to a sibling temp file first and is renamed into
    /// place, so readers never observe a half-written cache.
    #[tracing::instrument(skip(self, releases))]
    pub fn save(&self, releases: &[Release]) -> Result<()> {
        let content = serde_json::to_string_pretty(releases).map_err(|source| {
            SolcError::Decode {
                what: "release list for the cache".to_string(),
                source,
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        self.runtime
            .write(&temp_path, content.as_bytes())
            .map_err(|e| SolcError::io(format!("Failed to write release cache {:?}", temp_path), e))?;

        if let Err(e) = self.runtime.rename(&temp_path, &self.path) {
            let _ = self.runtime.remove_file(&temp_path);
            return Err(SolcError::io(
                format!("Failed to move release cache into {:?}", self.path),
                e,
            ));
        }

        debug!("Saved {} releases to {:?}", releases.len(), self.path);
        Ok(())
    }
}
