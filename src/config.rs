//! Configuration consumed by the release manager.

use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SolcError};
use crate::runtime::Runtime;

/// Release listing of the upstream Solidity repository.
pub const DEFAULT_RELEASES_URL: &str = "https://api.github.com/repos/ethereum/solidity/releases";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "solc-switch";

#[derive(Clone)]
pub struct Config {
    releases_dir: PathBuf,
    releases_url: String,
    http_timeout: Duration,
    access_token: Option<String>,
}

impl Config {
    pub fn new(releases_dir: impl Into<PathBuf>) -> Self {
        Self {
            releases_dir: releases_dir.into(),
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            access_token: None,
        }
    }

    pub fn with_releases_url(mut self, url: impl Into<String>) -> Self {
        self.releases_url = url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Token sent as a bearer credential. Empty tokens are ignored.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn releases_dir(&self) -> &Path {
        &self.releases_dir
    }

    pub fn releases_url(&self) -> &str {
        &self.releases_url
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn validate<R: Runtime>(&self, runtime: &R) -> Result<()> {
        validate_path(runtime, &self.releases_dir)?;

        if self.releases_url.trim().is_empty() {
            return Err(SolcError::Config("releases url is empty".into()));
        }

        Ok(())
    }

    /// Build the HTTP client shared by the syncer and the fetcher.
    pub fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.access_token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SolcError::Config("access token is not a valid header value".into()))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using access token for authentication: {}", mask_token(token));
        }

        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.http_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SolcError::Config(format!("failed to build HTTP client: {}", e)))
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("releases_dir", &self.releases_dir)
            .field("releases_url", &self.releases_url)
            .field("http_timeout", &self.http_timeout)
            .field("access_token", &self.access_token.as_deref().map(mask_token))
            .finish()
    }
}

/// Check that `path` exists, is a directory, and can be listed.
#[tracing::instrument(skip(runtime))]
pub fn validate_path<R: Runtime>(runtime: &R, path: &Path) -> Result<()> {
    let invalid = |reason: &str| SolcError::Path {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !runtime.exists(path) {
        return Err(invalid("path does not exist"));
    }

    if !runtime.is_dir(path) {
        return Err(invalid("path is not a directory"));
    }

    runtime
        .read_dir(path)
        .map_err(|_| invalid("directory is not readable"))?;

    Ok(())
}

/// `<home>/.solc-switch/releases`
pub fn default_releases_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let home = runtime
        .home_dir()
        .ok_or_else(|| SolcError::Config("could not find home directory".into()))?;
    Ok(home.join(".solc-switch").join("releases"))
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
