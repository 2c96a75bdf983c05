//! Datatypes to better represent the domain of FlickFinder.

use crate::ValidationError;
use flickfinder_settings::FlickrSettings;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

/// Valid latitudes, in degrees.
const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitudes, in degrees.
const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// The parameters of a photo search, in the order they were added.
///
/// Keys are unique. Inserting a key that is already present replaces its value
/// without moving it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchParameters(Vec<(String, String)>);

impl SearchParameters {
    /// An empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    /// The value of `key`, if it is set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is set.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A point on the globe, known to be in range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coordinates {
    /// Degrees north of the equator, in `[-90, 90]`.
    latitude: f64,
    /// Degrees east of the prime meridian, in `[-180, 180]`.
    longitude: f64,
}

impl Coordinates {
    /// Validate a latitude/longitude pair.
    ///
    /// # Errors
    /// [`ValidationError::Range`] if either value is outside its range, or is NaN.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if LATITUDE_RANGE.contains(&latitude) && LONGITUDE_RANGE.contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(ValidationError::Range {
                latitude,
                longitude,
            })
        }
    }

    /// Read coordinates from two text fields, as typed by a user.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// [`ValidationError::Unparsable`] if a field is empty or is not a number,
    /// and [`ValidationError::Range`] if the numbers are off the globe.
    pub fn from_text(latitude: &str, longitude: &str) -> Result<Self, ValidationError> {
        Self::new(parse_degrees(latitude)?, parse_degrees(longitude)?)
    }

    /// Degrees north of the equator.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Degrees east of the prime meridian.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Parse one coordinate field.
fn parse_degrees(text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Unparsable(text.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::Unparsable(text.to_string()))
}

/// A rectangle on the globe, in the form Flickr's `bbox` parameter expects.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Western edge.
    pub min_longitude: f64,
    /// Southern edge.
    pub min_latitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
}

impl BoundingBox {
    /// The box extending `half_width` degrees east and west and `half_height`
    /// degrees north and south of `center`, clamped to the globe.
    ///
    /// The sign of the half sizes is ignored.
    pub fn around(center: Coordinates, half_width: f64, half_height: f64) -> Self {
        let half_width = half_width.abs();
        let half_height = half_height.abs();

        Self {
            min_longitude: (center.longitude - half_width).max(*LONGITUDE_RANGE.start()),
            min_latitude: (center.latitude - half_height).max(*LATITUDE_RANGE.start()),
            max_longitude: (center.longitude + half_width).min(*LONGITUDE_RANGE.end()),
            max_latitude: (center.latitude + half_height).min(*LATITUDE_RANGE.end()),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_longitude, self.min_latitude, self.max_longitude, self.max_latitude
        )
    }
}

/// The fixed part of a request URL: everything but the query string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Such as `https`.
    pub scheme: String,
    /// Such as `api.flickr.com`, optionally with a port.
    pub host: String,
    /// Such as `/services/rest`.
    pub path: String,
}

impl From<&FlickrSettings> for Endpoint {
    fn from(settings: &FlickrSettings) -> Self {
        Self {
            scheme: settings.scheme.clone(),
            host: settings.host.clone(),
            path: settings.path.clone(),
        }
    }
}
