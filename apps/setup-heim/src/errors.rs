//! Error types for setup-heim.
//!
//! `SetupError` covers every way an installation can fail. Nothing in the
//! resolver or the install pipeline recovers from an error locally: each
//! variant aborts the run and is reported once, at the top level, as a single
//! human-readable message. Several messages are matched on by workflow authors,
//! so their wording is fixed.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the resolver and install pipeline.
pub type Result<T> = std::result::Result<T, SetupError>;

/// Consolidated error type for resolution and installation.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The host CPU architecture has no vendor build.
    #[error("Unsupported architecture '{arch}'")]
    UnsupportedArchitecture {
        /// The host architecture identifier as reported.
        arch: String,
    },

    /// The release service had no release for a floating or major specifier.
    #[error("Unabled to find a version matching {specifier}")]
    VersionNotFound {
        /// The specifier exactly as the user supplied it.
        specifier: String,
    },

    /// A version string is not a strict `MAJOR.MINOR.PATCH` version.
    #[error("Invalid version '{version}': {reason}")]
    MalformedVersion {
        /// The offending version text.
        version: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The server answered the archive download with an HTTP error.
    #[error("Unexpected HTTP response: {status_code}")]
    DownloadFailed {
        /// Numeric HTTP status code.
        status_code: u16,
        /// The URL that was requested.
        url: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("request to {url} failed")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    HttpClient {
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A successful response carried a body that could not be decoded.
    #[error("invalid response from {url}")]
    InvalidResponse {
        /// The URL that was requested.
        url: String,
        /// The underlying decode error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An archive could not be unpacked.
    #[error("failed to extract {}: {message}", archive.display())]
    ExtractionFailed {
        /// The archive being extracted.
        archive: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Copying an extracted tree into the tool cache failed.
    #[error("failed to write tool cache entry {}", path.display())]
    CacheWriteFailed {
        /// The cache path being written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Any other filesystem failure.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required setting could not be determined from the environment.
    #[error("unable to determine {name}")]
    MissingConfiguration {
        /// Name of the missing setting.
        name: &'static str,
    },
}

impl SetupError {
    /// Creates a new `UnsupportedArchitecture` error.
    #[must_use]
    pub fn unsupported_architecture(arch: impl Into<String>) -> Self {
        Self::UnsupportedArchitecture { arch: arch.into() }
    }

    /// Creates a new `VersionNotFound` error.
    #[must_use]
    pub fn version_not_found(specifier: impl Into<String>) -> Self {
        Self::VersionNotFound {
            specifier: specifier.into(),
        }
    }

    /// Creates a new `MalformedVersion` error.
    #[must_use]
    pub fn malformed_version(version: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedVersion {
            version: version.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new `DownloadFailed` error.
    #[must_use]
    pub fn download_failed(status_code: u16, url: impl Into<String>) -> Self {
        Self::DownloadFailed {
            status_code,
            url: url.into(),
        }
    }

    /// Creates a new `ExtractionFailed` error.
    #[must_use]
    pub fn extraction_failed(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Returns the HTTP status code carried by a download failure.
    #[cfg(test)]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::DownloadFailed { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
