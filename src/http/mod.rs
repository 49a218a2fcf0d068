//! HTTP client module: JSON listing pages and streamed file downloads.

mod client;

pub use client::HttpClient;
