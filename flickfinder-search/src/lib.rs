#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! The domain of FlickFinder: turning what the user typed into a photo search,
//! and the types every photo source shares.
//!
//! The [`QueryBuilder`] converts a phrase or a latitude/longitude pair into
//! [`SearchParameters`], which [`serialize_to_url`] turns into a request URL.
//! A [`PhotoSource`], such as the Flickr client, runs the search and resolves
//! one photo.

mod domain;
pub mod query;
mod select;
mod timeout;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use crate::domain::{BoundingBox, Coordinates, Endpoint, SearchParameters};
pub use crate::query::{redact_api_key, serialize_to_url, QueryBuilder};
pub use crate::select::{IndexSelector, SeededSelector, ThreadRngSelector};
pub use crate::timeout::TimeoutSource;

/// A photo chosen by a search, ready to be displayed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhotoResult {
    /// The title of the photo. Flickr does not require photos to have one.
    pub title: Option<String>,

    /// Where the image was downloaded from.
    pub image_url: String,

    /// The raw bytes of the medium sized image.
    #[serde(skip)]
    pub image: Vec<u8>,
}

/// A backend that can find a photo for a search.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// An operator-visible name for this source.
    fn name(&self) -> String;

    /// Run the search described by `params`, pick one of the matching photos
    /// at random and download its image.
    async fn fetch_random_photo(&self, params: SearchParameters)
        -> Result<PhotoResult, SearchError>;
}

/// Errors caused by what the user typed. Nothing is sent over the network when
/// one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The phrase was empty, or only whitespace.
    #[error("The search phrase is empty")]
    EmptyInput,

    /// The coordinates were numbers, but outside the globe.
    #[error("Latitude must be within [-90, 90] and longitude within [-180, 180], got ({latitude}, {longitude})")]
    Range {
        /// The latitude given.
        latitude: f64,
        /// The longitude given.
        longitude: f64,
    },

    /// A coordinate field did not hold a number.
    #[error("Could not read a coordinate from {0:?}")]
    Unparsable(String),
}

/// Errors that may occur while setting up a photo source.
#[derive(Debug, Error)]
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub enum SetupError {
    #[error("This photo source cannot be used with the current configuration")]
    InvalidConfiguration(#[source] anyhow::Error),

    #[error("There was a network error while setting up this photo source")]
    Network(#[source] anyhow::Error),
}

/// Errors that may occur while searching for a photo.
///
/// Each variant is produced by exactly one stage of a search, so the variant
/// tells how far the search got.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The configured endpoint could not be combined into a URL.
    #[error("Could not build a request URL: {0}")]
    UrlConstruction(#[source] anyhow::Error),

    /// The search request did not complete.
    #[error("There was a network error while searching: {0}")]
    Transport(#[source] anyhow::Error),

    /// The search request completed with a status outside of 2xx.
    #[error("The search returned HTTP status {0}")]
    HttpStatus(u16),

    /// The search response had no body.
    #[error("The search returned an empty body")]
    EmptyBody,

    /// The search response was not a JSON object.
    #[error("Could not parse the search response: {0}")]
    Parse(#[source] anyhow::Error),

    /// The API reported a failure. Holds the whole response document.
    #[error("The photo API returned an error: {0}")]
    ApiStatus(serde_json::Value),

    /// A field needed to continue was missing or had the wrong type.
    #[error("The search response is missing the {0:?} field")]
    MissingField(&'static str),

    /// The search succeeded, but matched no photos.
    #[error("The search matched no photos")]
    NoResults,

    /// A photo was chosen, but its image could not be downloaded.
    #[error("Could not download the photo: {0}")]
    ImageFetch(#[source] anyhow::Error),

    /// The whole search took longer than allowed.
    #[error("The search took longer than {0:?}")]
    TimedOut(Duration),
}
