use std::fmt;

use crate::release::{Asset, Release, normalize_tag};

/// Operating system family solc publishes builds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Windows,
    MacOS,
    Linux,
    Unknown,
}

impl Distribution {
    /// Map an OS name (as reported by [`super::Platform`] or `std::env::consts::OS`).
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Distribution::Windows,
            "macos" | "darwin" => Distribution::MacOS,
            "linux" => Distribution::Linux,
            _ => Distribution::Unknown,
        }
    }

    /// Substring identifying this platform's build among a release's assets.
    pub fn asset_token(&self) -> &'static str {
        match self {
            Distribution::Windows => "solc-windows",
            Distribution::MacOS => "solc-macos",
            Distribution::Linux => "solc-static-linux",
            Distribution::Unknown => "unknown",
        }
    }

    /// Local file name of the binary for `version` (normalized).
    pub fn binary_file_name(&self, version: &str) -> String {
        let mut name = format!("solc-{}", normalize_tag(version));
        if *self == Distribution::Windows {
            name.push_str(".exe");
        }
        name
    }

    /// First asset of the release built for this platform.
    pub fn pick_asset<'a>(&self, release: &'a Release) -> Option<&'a Asset> {
        let token = self.asset_token();
        release.assets.iter().find(|asset| asset.name.contains(token))
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Distribution::Windows => "windows",
            Distribution::MacOS => "darwin",
            Distribution::Linux => "linux",
            Distribution::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release_with_assets(names: &[&str]) -> Release {
        Release {
            tag_name: "v0.8.20".into(),
            assets: names
                .iter()
                .map(|name| Asset {
                    name: name.to_string(),
                    browser_download_url: format!("https://example.com/{}", name),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_os() {
        assert_eq!(Distribution::from_os("windows"), Distribution::Windows);
        assert_eq!(Distribution::from_os("macos"), Distribution::MacOS);
        assert_eq!(Distribution::from_os("darwin"), Distribution::MacOS);
        assert_eq!(Distribution::from_os("linux"), Distribution::Linux);
        assert_eq!(Distribution::from_os("plan9"), Distribution::Unknown);
    }

    #[test]
    fn test_asset_tokens() {
        assert_eq!(Distribution::Windows.asset_token(), "solc-windows");
        assert_eq!(Distribution::MacOS.asset_token(), "solc-macos");
        assert_eq!(Distribution::Linux.asset_token(), "solc-static-linux");
        assert_eq!(Distribution::Unknown.asset_token(), "unknown");
    }

    #[test]
    fn test_binary_file_name() {
        assert_eq!(
            Distribution::Linux.binary_file_name("v0.8.20"),
            "solc-0.8.20"
        );
        assert_eq!(Distribution::MacOS.binary_file_name("0.8.20"), "solc-0.8.20");
        assert_eq!(
            Distribution::Windows.binary_file_name("v0.8.20"),
            "solc-0.8.20.exe"
        );
    }

    #[test]
    fn test_pick_asset_by_token() {
        let release = release_with_assets(&[
            "solc-macos",
            "solc-static-linux",
            "solc-windows.exe",
            "solidity_0.8.20.tar.gz",
        ]);

        assert_eq!(
            Distribution::Linux.pick_asset(&release).unwrap().name,
            "solc-static-linux"
        );
        assert_eq!(
            Distribution::Windows.pick_asset(&release).unwrap().name,
            "solc-windows.exe"
        );
        assert!(Distribution::Unknown.pick_asset(&release).is_none());
    }

    #[test]
    fn test_pick_asset_missing_build() {
        let release = release_with_assets(&["solidity_0.4.0.tar.gz"]);
        assert!(Distribution::MacOS.pick_asset(&release).is_none());
    }
}
