//! The release manager.
//!
//! [`Solc`] is built once at startup and owns everything the sync, fetch and
//! query operations share: configuration, the HTTP client, the runtime, the
//! platform detector, the clock, the cancellation token, and the in-memory
//! mirror of the release cache.

use log::debug;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::compiler::{Compiler, CompilerConfig, CompilerResults};
use crate::config::Config;
use crate::error::{Result, SolcError};
use crate::http::HttpClient;
use crate::platform::{DefaultPlatformDetector, Distribution, PlatformDetector};
use crate::release::{Release, ReleaseStore, normalize_tag};
use crate::runtime::Runtime;

pub struct Solc<R: Runtime> {
    pub(crate) runtime: R,
    pub(crate) config: Config,
    pub(crate) http_client: HttpClient,
    pub(crate) platform: Box<dyn PlatformDetector>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) cancel: CancellationToken,
    local_releases: RwLock<Option<Vec<Release>>>,
    last_sync: Mutex<Option<Instant>>,
}

impl<R: Runtime> Solc<R> {
    /// Validate `config` and build a manager with the default platform
    /// detector, system clock and a fresh cancellation token.
    pub fn new(runtime: R, config: Config) -> Result<Self> {
        config.validate(&runtime)?;
        let http_client = HttpClient::new(config.build_client()?);

        debug!("Using releases directory {:?}", config.releases_dir());

        Ok(Self {
            runtime,
            config,
            http_client,
            platform: Box::new(DefaultPlatformDetector),
            clock: Box::new(SystemClock),
            cancel: CancellationToken::new(),
            local_releases: RwLock::new(None),
            last_sync: Mutex::new(None),
        })
    }

    pub fn with_platform(mut self, platform: impl PlatformDetector + 'static) -> Self {
        self.platform = Box::new(platform);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Use a caller-owned token; cancelling it stops downloads that have not
    /// started yet.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// When the last successful release sync finished, if any.
    pub fn last_sync_time(&self) -> Option<Instant> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn distribution(&self) -> Distribution {
        self.platform.detect().distribution()
    }

    /// Returns: `<releases_dir>/releases.json`
    pub fn local_releases_path(&self) -> PathBuf {
        self.store().path().to_path_buf()
    }

    /// Where the binary for `version` lives on this platform, present or not.
    pub fn binary_path(&self, version: &str) -> PathBuf {
        self.config
            .releases_dir()
            .join(self.distribution().binary_file_name(version))
    }

    pub(crate) fn store(&self) -> ReleaseStore<'_, R> {
        ReleaseStore::new(&self.runtime, self.config.releases_dir())
    }

    pub(crate) fn mirror(&self) -> Option<Vec<Release>> {
        self.local_releases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_mirror(&self, releases: Vec<Release>) {
        *self
            .local_releases
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(releases);
    }

    pub(crate) fn mark_synced(&self, at: Instant) {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    /// Refresh release metadata, then download every missing binary for
    /// this platform.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<()> {
        let releases = self.sync_releases().await?;

        debug!("Syncing solc binaries for {} releases...", releases.len());

        self.sync_binaries(&releases, None).await
    }

    /// Refresh release metadata, then download the binary of one version.
    #[tracing::instrument(skip(self))]
    pub async fn sync_one(&self, version: &str) -> Result<()> {
        let releases = self.sync_releases().await?;
        let wanted = normalize_tag(version);

        if !releases.iter().any(|r| r.version() == wanted) {
            return Err(SolcError::ReleaseNotFound {
                tag: wanted.to_string(),
            });
        }

        debug!(
            "Synchronizing solc release {} ({} releases known)",
            wanted,
            releases.len()
        );

        self.sync_binaries(&releases, Some(wanted)).await
    }

    /// Compile `source` with the binary selected by `config`.
    pub async fn compile(&self, source: &str, config: CompilerConfig) -> Result<CompilerResults> {
        Compiler::new(self, config, source)?.compile().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::runtime::RealRuntime;
    use crate::test_utils::{fixed_platform, release_json, test_solc};
    use tempfile::tempdir;

    #[test]
    fn test_new_rejects_missing_dir() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("missing"));

        let result = Solc::new(RealRuntime, config);
        assert!(matches!(result, Err(SolcError::Path { .. })));
    }

    #[test]
    fn test_new_starts_unsynced() {
        let dir = tempdir().unwrap();
        let solc = Solc::new(RealRuntime, Config::new(dir.path())).unwrap();

        assert!(solc.last_sync_time().is_none());
        assert!(solc.get_cached_releases().is_none());
        assert!(!solc.cancellation_token().is_cancelled());
        assert_eq!(
            solc.local_releases_path(),
            dir.path().join("releases.json")
        );
    }

    #[test]
    fn test_binary_path_follows_platform() {
        let dir = tempdir().unwrap();
        let solc = Solc::new(RealRuntime, Config::new(dir.path()))
            .unwrap()
            .with_platform(fixed_platform(Platform::new("windows")));

        assert_eq!(solc.distribution(), Distribution::Windows);
        assert_eq!(
            solc.binary_path("v0.8.20"),
            dir.path().join("solc-0.8.20.exe")
        );
    }

    #[tokio::test]
    async fn test_sync_one_unknown_version() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_body(format!("[{}]", release_json("v0.8.20", &url)))
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/releases?page=2")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let download = server
            .mock("GET", mockito::Matcher::Regex("^/download/.*".into()))
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let solc = test_solc(dir.path(), &url);

        let err = solc.sync_one("0.1.0").await.unwrap_err();
        assert!(matches!(err, SolcError::ReleaseNotFound { ref tag } if tag == "0.1.0"));
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_sync_one_downloads_only_requested_version() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_body(format!(
                "[{},{}]",
                release_json("v0.8.21", &url),
                release_json("v0.8.20", &url)
            ))
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/releases?page=2")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let wanted = server
            .mock("GET", "/download/v0.8.20/solc-static-linux")
            .with_status(200)
            .with_body("solc 0.8.20")
            .expect(1)
            .create_async()
            .await;
        let other = server
            .mock("GET", "/download/v0.8.21/solc-static-linux")
            .expect(0)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let solc = test_solc(dir.path(), &url);

        solc.sync_one("v0.8.20").await.unwrap();

        wanted.assert_async().await;
        other.assert_async().await;
        assert!(dir.path().join("solc-0.8.20").exists());
        assert!(!dir.path().join("solc-0.8.21").exists());
    }
}
