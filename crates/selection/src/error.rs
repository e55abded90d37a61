//! Selection error types.

use thiserror::Error;

/// Errors that can occur while ranking vendor candidates.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Every candidate was filtered out before scoring.
    #[error("no candidates available after filtering")]
    NoCandidatesAvailable,
}

/// Convenience type alias for selection results.
pub type Result<T> = std::result::Result<T, SelectionError>;
