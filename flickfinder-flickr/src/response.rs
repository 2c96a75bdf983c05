//! Reading the response of `flickr.photos.search`.
//!
//! Responses look like this, with many more fields per photo:
//!
//! ```json
//! {
//!   "stat": "ok",
//!   "photos": {
//!     "page": 1,
//!     "photo": [{ "id": "1", "title": "Sunset", "url_m": "https://live.staticflickr.com/1.jpg" }]
//!   }
//! }
//! ```
//!
//! Failures keep the same `stat` field, with a code and a message instead of
//! photos.

use anyhow::{anyhow, Context};
use flickfinder_search::{IndexSelector, SearchError};
use serde_json::Value;

/// The value of `stat` in a successful response.
pub const OK_STATUS: &str = "ok";

/// Field names in the response document.
mod keys {
    #![allow(clippy::missing_docs_in_private_items)]

    pub const STATUS: &str = "stat";
    pub const PHOTOS: &str = "photos";
    pub const PHOTO: &str = "photo";
    pub const TITLE: &str = "title";
    pub const MEDIUM_URL: &str = "url_m";
}

/// The parts of a search result needed to show it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoRecord {
    /// The title, if the photo has one.
    pub title: Option<String>,
    /// Where to download the medium sized image.
    pub medium_url: String,
}

impl PhotoRecord {
    /// Read a record from one entry of `photos.photo`.
    ///
    /// A `title` that is not a string is treated as missing.
    fn from_value(value: &Value) -> Result<Self, SearchError> {
        let title = value
            .get(keys::TITLE)
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let medium_url = value
            .get(keys::MEDIUM_URL)
            .and_then(Value::as_str)
            .ok_or(SearchError::MissingField(keys::MEDIUM_URL))?
            .to_string();

        Ok(Self { title, medium_url })
    }
}

/// Validate a search response body and pick one photo out of it.
///
/// The checks run in order and the first one to fail decides the error: the
/// body must be a JSON object, `stat` must be `"ok"`, `photos.photo` must be a
/// non-empty array, and the chosen entry must have a `url_m`.
pub fn choose_photo(body: &[u8], selector: &dyn IndexSelector) -> Result<PhotoRecord, SearchError> {
    if body.is_empty() {
        return Err(SearchError::EmptyBody);
    }

    let document: Value = serde_json::from_slice(body)
        .context("Parsing search response as JSON")
        .map_err(SearchError::Parse)?;

    if !document.is_object() {
        return Err(SearchError::Parse(anyhow!(
            "Expected a JSON object at the top level, got {}",
            document
        )));
    }

    if document.get(keys::STATUS).and_then(Value::as_str) != Some(OK_STATUS) {
        return Err(SearchError::ApiStatus(document));
    }

    let photos = document
        .get(keys::PHOTOS)
        .and_then(|photos| photos.get(keys::PHOTO))
        .and_then(Value::as_array)
        .ok_or(SearchError::MissingField("photos.photo"))?;

    if photos.is_empty() {
        return Err(SearchError::NoResults);
    }

    // Keep a selector that ignores `len` in bounds.
    let index = selector.select(photos.len()) % photos.len();
    tracing::debug!(index, count = photos.len(), "chose photo");

    PhotoRecord::from_value(&photos[index])
}
