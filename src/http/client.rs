//! HTTP client that maps transport, status and decode failures onto
//! [`SolcError`] variants. There is no retry here: callers decide.

use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::io::Write;

use crate::error::{Result, SolcError};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self.send(url, query).await?;

        let body = response.bytes().await.map_err(|source| SolcError::Network {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| SolcError::Decode {
            what: format!("response from {}", url),
            source,
        })
    }

    /// Streams the body of `url` into the writer produced by `create_writer`.
    ///
    /// The writer is only created once the server has answered with a 2xx
    /// status, so a failed request never leaves an empty file behind.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        let mut response = self.send(url, &[]).await?;
        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(|source| SolcError::Network {
            url: url.to_string(),
            source,
        })? {
            writer
                .write_all(&chunk)
                .map_err(|e| SolcError::io("Failed to write chunk to file", e.into()))?;
            downloaded_bytes += chunk.len() as u64;
        }

        writer
            .flush()
            .map_err(|e| SolcError::io("Failed to flush downloaded file", e.into()))?;

        debug!(
            "Downloaded {:.2} MB from {}",
            downloaded_bytes as f64 / (1024.0 * 1024.0),
            url
        );

        Ok(downloaded_bytes)
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| SolcError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolcError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }
}
