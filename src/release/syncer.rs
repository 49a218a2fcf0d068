//! Remote release listing with a re-sync throttle.

use log::{debug, info};
use std::time::Duration;

use crate::error::Result;
use crate::runtime::Runtime;
use crate::solc::Solc;

use super::Release;

/// Minimum time between two remote listings. Four syncs a day is plenty for
/// a compiler that ships a handful of releases a year.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

impl<R: Runtime> Solc<R> {
    /// Fetch every page of the remote release listing, persist it and
    /// replace the in-memory mirror.
    ///
    /// Within [`SYNC_INTERVAL`] of the last successful sync this returns the
    /// mirror as is, without touching the network. Remote order (newest
    /// first) is kept as received.
    #[tracing::instrument(skip(self))]
    pub async fn sync_releases(&self) -> Result<Vec<Release>> {
        if let Some(last_sync) = self.last_sync_time()
            && self.clock.now().saturating_duration_since(last_sync) < SYNC_INTERVAL
        {
            debug!("Releases synced recently, using cached release list");
            return Ok(self.mirror().unwrap_or_default());
        }

        let url = self.config.releases_url();
        let mut releases = Vec::new();
        let mut page: u32 = 1;

        loop {
            debug!("Fetching releases page {} from {}...", page, url);

            let page_str = page.to_string();
            let parsed: Vec<Release> = self
                .http_client
                .get_json_with_query(url, &[("page", page_str.as_str())])
                .await?;

            if parsed.is_empty() {
                break;
            }

            releases.extend(parsed);
            page += 1;
        }

        self.store().save(&releases)?;

        info!("Synced {} solc releases", releases.len());

        self.set_mirror(releases.clone());
        self.mark_synced(self.clock.now());

        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::error::SolcError;
    use crate::test_utils::{release_json, test_solc};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tempfile::tempdir;

    /// Clock whose time the test moves forward by hand.
    fn manual_clock() -> (MockClock, Arc<Mutex<Instant>>) {
        let now = Arc::new(Mutex::new(Instant::now()));
        let handle = Arc::clone(&now);
        let mut clock = MockClock::new();
        clock
            .expect_now()
            .returning(move || *handle.lock().unwrap());
        (clock, now)
    }

    #[tokio::test]
    async fn test_sync_releases_multiple_pages() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                "[{},{}]",
                release_json("v0.8.21", &url),
                release_json("v0.8.20", &url)
            ))
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/releases?page=2")
            .with_status(200)
            .with_body(format!("[{}]", release_json("v0.8.19", &url)))
            .create_async()
            .await;
        let page3 = server
            .mock("GET", "/releases?page=3")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let solc = test_solc(dir.path(), &url);

        let releases = solc.sync_releases().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        page3.assert_async().await;

        let tags: Vec<&str> = releases.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v0.8.21", "v0.8.20", "v0.8.19"]);

        // Mirror, cache file and timestamp are reconciled
        assert_eq!(solc.get_cached_releases(), Some(releases.clone()));
        assert_eq!(solc.store().load().unwrap(), releases);
        assert!(solc.last_sync_time().is_some());
    }

    #[tokio::test]
    async fn test_sync_releases_throttled_within_interval() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_body(format!("[{}]", release_json("v0.8.20", &url)))
            .expect(1)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/releases?page=2")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (clock, now) = manual_clock();
        let solc = test_solc(dir.path(), &url).with_clock(clock);

        let first = solc.sync_releases().await.unwrap();

        *now.lock().unwrap() += SYNC_INTERVAL - Duration::from_secs(1);
        let second = solc.sync_releases().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sync_releases_after_interval_fetches_again() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_body(format!("[{}]", release_json("v0.8.20", &url)))
            .expect(2)
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/releases?page=2")
            .with_status(200)
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let (clock, now) = manual_clock();
        let solc = test_solc(dir.path(), &url).with_clock(clock);

        solc.sync_releases().await.unwrap();
        *now.lock().unwrap() += SYNC_INTERVAL;
        solc.sync_releases().await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
    }

    #[tokio::test]
    async fn test_sync_releases_http_error_keeps_state() {
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
            .with_status(502)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let solc = test_solc(dir.path(), &url);

        let err = solc.sync_releases().await.unwrap_err();

        assert!(err.is_network());
        assert!(solc.get_cached_releases().is_none());
        assert!(solc.last_sync_time().is_none());
        assert!(!solc.store().exists());
    }

    #[tokio::test]
    async fn test_sync_releases_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _page1 = server
            .mock("GET", "/releases?page=1")
            .with_status(200)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let solc = test_solc(dir.path(), &url);

        let err = solc.sync_releases().await.unwrap_err();
        assert!(matches!(err, SolcError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_sync_releases_sends_access_token() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1 = server
            .mock("GET", "/releases?page=1")
            .match_header("Authorization", "Bearer secret-token")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let config = crate::config::Config::new(dir.path())
            .with_releases_url(format!("{}/releases", url))
            .with_access_token(Some("secret-token".into()));
        let solc = Solc::new(crate::runtime::RealRuntime, config).unwrap();

        let releases = solc.sync_releases().await.unwrap();

        page1.assert_async().await;
        assert!(releases.is_empty());
        assert_eq!(solc.store().load().unwrap(), Vec::<Release>::new());
    }
}
