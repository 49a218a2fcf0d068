//! Release metadata and the operations built on it.
//!
//! - `store` - the persisted `releases.json` cache
//! - `syncer` - paginated remote listing with the re-sync throttle
//! - `fetcher` - concurrent download of missing platform binaries
//! - `query` - lookups over the mirror or the persisted cache

mod fetcher;
mod query;
pub mod store;
mod syncer;

use serde::{Deserialize, Serialize};

pub use fetcher::{DOWNLOAD_JITTER_MS, DownloadTask, PROGRESS_INTERVAL};
pub use store::ReleaseStore;
pub use syncer::SYNC_INTERVAL;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Asset {
    pub name: String,
    #[serde(default)]
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_type: String,
}

/// A published solc release.
///
/// This type is used both for API responses and for the local cache file, so
/// everything except the tag is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Release {
    /// Version tag (e.g., "v0.8.20")
    pub tag_name: String,
    /// Release name/title
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    /// Creation date (ISO 8601)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Publication date (ISO 8601)
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub tarball_url: Option<String>,
    #[serde(default)]
    pub zipball_url: Option<String>,
    /// Release notes
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Tag without its version prefix.
    pub fn version(&self) -> &str {
        normalize_tag(&self.tag_name)
    }

    pub fn version_info(&self, latest_tag: &str) -> VersionInfo {
        VersionInfo {
            tag_name: self.tag_name.clone(),
            is_latest: self.tag_name == latest_tag,
            is_prerelease: self.prerelease,
        }
    }
}

/// Simplified listing entry for a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionInfo {
    pub tag_name: String,
    pub is_latest: bool,
    pub is_prerelease: bool,
}

/// Strip the version prefix from a tag: "v0.8.20" -> "0.8.20".
pub fn normalize_tag(tag: &str) -> &str {
    tag.trim_start_matches(['v', 'V'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("v0.8.20"), "0.8.20");
        assert_eq!(normalize_tag("0.8.20"), "0.8.20");
        assert_eq!(normalize_tag("V0.8.20"), "0.8.20");
        assert_eq!(normalize_tag(""), "");
    }

    #[test]
    fn test_normalize_tag_is_idempotent() {
        for tag in ["v0.8.20", "0.8.20", "vv1.2.3", "V1", "v", "nightly-2024"] {
            let once = normalize_tag(tag);
            assert_eq!(normalize_tag(once), once, "tag {:?}", tag);
        }
    }

    #[test]
    fn test_version_info() {
        let release = Release {
            tag_name: "v0.8.21".into(),
            prerelease: true,
            ..Default::default()
        };

        let info = release.version_info("v0.8.21");
        assert!(info.is_latest);
        assert!(info.is_prerelease);

        let info = release.version_info("v0.8.22");
        assert!(!info.is_latest);
        assert_eq!(info.tag_name, "v0.8.21");
    }

    #[test]
    fn test_release_decodes_github_payload() {
        let json = r#"{
            "url": "https://api.github.com/repos/ethereum/solidity/releases/1",
            "id": 1,
            "tag_name": "v0.8.20",
            "name": "Version 0.8.20",
            "draft": false,
            "prerelease": false,
            "created_at": "2023-05-10T10:00:00Z",
            "published_at": "2023-05-10T12:00:00Z",
            "author": { "login": "ethereum" },
            "assets": [
                {
                    "name": "solc-static-linux",
                    "size": 9000000,
                    "content_type": "application/octet-stream",
                    "browser_download_url": "https://github.com/ethereum/solidity/releases/download/v0.8.20/solc-static-linux"
                }
            ]
        }"#;

        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v0.8.20");
        assert_eq!(release.version(), "0.8.20");
        assert_eq!(release.name.as_deref(), Some("Version 0.8.20"));
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].size, 9000000);
        assert!(release.body.is_none());
    }

    #[test]
    fn test_release_minimal_payload() {
        let release: Release = serde_json::from_str(r#"{"tag_name": "v0.1.0"}"#).unwrap();
        assert!(release.assets.is_empty());
        assert!(!release.draft);
        assert!(!release.prerelease);
    }
}
