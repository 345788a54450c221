use thiserror::Error;

/// Errors surfaced by the document engine.
///
/// Only whole-document load failures reach the user. Per-run and per-pixel
/// problems are recovered inside the extractor, and mutations that reference
/// unknown ids report `false` instead of failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocEditError {
    #[error("Failed to extract page {page}: {reason}")]
    Extraction { page: usize, reason: String },

    #[error("Page {page} rendered at {actual:?} but the shared scale requires {expected:?}")]
    ScaleMismatch {
        page: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Load {ticket} was superseded by load {current}")]
    SupersededLoad { ticket: u64, current: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocEditError {
    /// True for errors that abort a document load.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            DocEditError::Extraction { .. } | DocEditError::ScaleMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for DocEditError {
    fn from(err: serde_json::Error) -> Self {
        DocEditError::Serialization(err.to_string())
    }
}

/// Failure while reading pixels for a background hint. Never escapes the extractor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    #[error("sample region ({x}, {y}) is outside the {width}x{height} raster")]
    OutOfBounds {
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    #[error("raster pixels are not readable")]
    Restricted,

    #[error("raster has no pixels")]
    EmptyRaster,
}

pub type DocEditResult<T> = Result<T, DocEditError>;
