//! Error types for the streaming filter.
//!
//! A failure anywhere in a filter pass aborts the whole pass: a
//! half-applied blacklist is a worse security outcome than a hard
//! failure, so nothing here is recoverable mid-document.

use thiserror::Error;

/// A fatal failure during one filter pass.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The underlying parser rejected the document.
    #[error("malformed XML in filtered document: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Writing to the output sink failed. Propagated unchanged; retry
    /// policy belongs to the proxying layer.
    #[error("I/O failure while writing filtered output: {0}")]
    Io(#[from] std::io::Error),

    /// Start/end events do not balance, or the document ended early.
    /// The partially written output must not be served as complete.
    #[error("document structure corrupt: {0}")]
    Corrupt(String),

    /// An element name or label text is not valid UTF-8.
    #[error("non-UTF-8 content in filtered document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl FilterError {
    pub(crate) fn corrupt(detail: impl Into<String>) -> Self {
        Self::Corrupt(detail.into())
    }
}
