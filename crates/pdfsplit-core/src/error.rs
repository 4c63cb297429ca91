use thiserror::Error;

/// Broad classification used by boundary adapters to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

#[derive(Error, Debug)]
pub enum PdfSplitError {
    /// Expected structural data is missing (e.g. the document has no outline)
    #[error("{0}")]
    NotFound(String),

    /// Caller input is malformed: bad PDF, bad CSV, out-of-range pages
    #[error("{0}")]
    Validation(String),

    /// Archive or PDF serialization failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PdfSplitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfSplitError::NotFound(_) => ErrorKind::NotFound,
            PdfSplitError::Validation(_) => ErrorKind::Validation,
            PdfSplitError::Internal(_) => ErrorKind::Internal,
        }
    }
}
