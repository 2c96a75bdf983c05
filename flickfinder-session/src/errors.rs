//! Errors a session reports to the person searching.

use flickfinder_search::{SearchError, ValidationError};
use thiserror::Error;

/// Shown while a search is running.
pub const SEARCHING: &str = "Searching...";

/// Shown when a phrase search is started with nothing to search for.
pub const PHRASE_EMPTY: &str = "Phrase Empty.";

/// Shown when a location search has coordinates that can't be used.
pub const BAD_COORDINATES: &str = "Lat should be [-90, 90].\nLon should be [-180, 180].";

/// Shown when the search ran but produced no photo.
pub const NO_PHOTO: &str = "No photo returned.  Try again.";

/// The ways a session search can end without a photo.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another search is still running. Nothing was changed.
    #[error("A search is already in progress")]
    Busy,

    /// The input was rejected before anything was sent.
    #[error("Invalid search input: {0}")]
    Validation(#[from] ValidationError),

    /// The search was sent, but did not produce a photo.
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),
}

impl SessionError {
    /// The status text to show for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Busy => SEARCHING,
            Self::Validation(ValidationError::EmptyInput) => PHRASE_EMPTY,
            Self::Validation(ValidationError::Range { .. } | ValidationError::Unparsable(_)) => {
                BAD_COORDINATES
            }
            Self::Search(_) => NO_PHOTO,
        }
    }
}
