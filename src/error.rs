#![forbid(unsafe_code)]

//! Error taxonomy shared by every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The snapshot index has no usable capture for the profile.
    #[error("no archived snapshot found for {url}")]
    NotFound { url: String },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("writing {}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("reading response body from {url}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{page}: no element matches `{selector}`")]
    MissingElement { page: String, selector: String },
    #[error("{page}: `{selector}` has no `{attribute}` attribute")]
    MissingAttribute {
        page: String,
        selector: String,
        attribute: String,
    },
    #[error("{page}: video thumbnail #{index} is not wrapped in a link")]
    MissingLink { page: String, index: usize },
    #[error("{page}: upload date {text:?} does not match `{format}`: {reason}")]
    UploadDate {
        page: String,
        text: String,
        format: String,
        reason: String,
    },
    #[error("cannot build a URL from {input:?}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("snapshot index response from {url} is malformed: {reason}")]
    IndexResponse { url: String, reason: String },
}

impl ScrapeError {
    /// Whether this is the one failure the CLI reports as a plain message.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::NotFound { .. })
    }
}
