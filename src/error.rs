//! Error types for release synchronization, binary management and compilation.
//!
//! Query callers need to tell "not there yet" apart from "the network broke",
//! so every failure class gets its own variant instead of an opaque
//! `anyhow::Error`. The runtime layer still speaks `anyhow`; its failures are
//! wrapped into [`SolcError::Io`] together with a short context string.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::compiler::CompilerResults;

pub type Result<T, E = SolcError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SolcError {
    /// The releases directory is missing, not a directory, or unreadable.
    #[error("invalid releases directory {path:?}: {reason}")]
    Path { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Transport failure (connect, timeout, body read).
    #[error("request to {url} failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("failed to decode {what}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {error:#}")]
    Io {
        context: String,
        error: anyhow::Error,
    },

    /// The local releases cache has never been written.
    #[error("release cache {path:?} does not exist, sync first")]
    CacheMissing { path: PathBuf },

    #[error("release {tag} not found")]
    ReleaseNotFound { tag: String },

    #[error("binary for version {version} not found at {path:?}, sync first")]
    BinaryNotFound { version: String, path: PathBuf },

    #[error("no releases found in {path:?}")]
    Empty { path: PathBuf },

    #[error("download of solc {version} cancelled")]
    Cancelled { version: String },

    #[error("invalid compiler argument: {0}")]
    InvalidArgument(String),

    #[error("missing required compiler argument: {0}")]
    MissingArgument(String),

    #[error("invalid compiler version: {0:?}")]
    InvalidVersion(String),

    #[error("compiler error: {0}")]
    Compiler(String),

    /// solc ran but exited unsuccessfully. The partial results carry the
    /// diagnostics recovered from stderr.
    #[error("solc {version} failed to compile sources: {}", stderr.trim())]
    CompilationFailed {
        version: String,
        stderr: String,
        results: Box<CompilerResults>,
    },
}

impl SolcError {
    pub(crate) fn io(context: impl Into<String>, error: anyhow::Error) -> Self {
        SolcError::Io {
            context: context.into(),
            error,
        }
    }

    /// True for the conditions a caller can fix by syncing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SolcError::CacheMissing { .. }
                | SolcError::ReleaseNotFound { .. }
                | SolcError::BinaryNotFound { .. }
        )
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SolcError::Network { .. } | SolcError::HttpStatus { .. }
        )
    }
}
