//! Building Flickr `flickr.photos.search` requests.

use anyhow::{anyhow, Context};
use flickfinder_settings::Settings;
use reqwest::Url;

use crate::{BoundingBox, Coordinates, Endpoint, SearchError, SearchParameters, ValidationError};

/// Names of the query parameters Flickr understands.
pub mod keys {
    #![allow(missing_docs, clippy::missing_docs_in_private_items)]

    pub const METHOD: &str = "method";
    pub const API_KEY: &str = "api_key";
    pub const TEXT: &str = "text";
    pub const BOUNDING_BOX: &str = "bbox";
    pub const SAFE_SEARCH: &str = "safe_search";
    pub const EXTRAS: &str = "extras";
    pub const FORMAT: &str = "format";
    pub const NO_JSON_CALLBACK: &str = "nojsoncallback";
}

/// The fixed values sent with every search.
pub mod values {
    /// The API method that searches photos.
    pub const SEARCH_METHOD: &str = "flickr.photos.search";
    /// Exclude photos not marked as safe.
    pub const USE_SAFE_SEARCH: &str = "1";
    /// Ask for the URL of the medium sized image in every result.
    pub const MEDIUM_URL: &str = "url_m";
    /// Respond with JSON.
    pub const RESPONSE_FORMAT: &str = "json";
    /// Respond with a bare JSON document instead of a JSONP callback.
    pub const DISABLE_JSON_CALLBACK: &str = "1";
}

/// Turns user input into search parameters.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    /// Sent as `api_key` with every search.
    api_key: String,
    /// Degrees of longitude searched either side of a location.
    half_width: f64,
    /// Degrees of latitude searched either side of a location.
    half_height: f64,
}

impl QueryBuilder {
    /// Make a builder with an explicit key and box size.
    pub fn new<S: Into<String>>(api_key: S, half_width: f64, half_height: f64) -> Self {
        Self {
            api_key: api_key.into(),
            half_width,
            half_height,
        }
    }

    /// Make a builder from the `flickr` and `search` settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.flickr.api_key.clone(),
            settings.search.bbox_half_width,
            settings.search.bbox_half_height,
        )
    }

    /// Search for photos matching free text.
    ///
    /// The phrase is sent as given, it is only trimmed to check that it is not
    /// blank.
    ///
    /// # Errors
    /// [`ValidationError::EmptyInput`] if the phrase is empty or whitespace.
    pub fn phrase_query(&self, phrase: &str) -> Result<SearchParameters, ValidationError> {
        if phrase.trim().is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        Ok(self.parameters_with(keys::TEXT, phrase))
    }

    /// Search for photos taken near a point.
    ///
    /// # Errors
    /// [`ValidationError::Range`] if the point is off the globe.
    pub fn location_query(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<SearchParameters, ValidationError> {
        let center = Coordinates::new(latitude, longitude)?;
        Ok(self.parameters_with(keys::BOUNDING_BOX, self.bounding_box(center).to_string()))
    }

    /// The area searched around `center`.
    pub fn bounding_box(&self, center: Coordinates) -> BoundingBox {
        BoundingBox::around(center, self.half_width, self.half_height)
    }

    /// The full parameter set, with `key` as the one search criterion.
    fn parameters_with<V: Into<String>>(&self, key: &str, value: V) -> SearchParameters {
        let mut params = SearchParameters::new();
        params.insert(keys::METHOD, values::SEARCH_METHOD);
        params.insert(keys::API_KEY, self.api_key.as_str());
        params.insert(key, value);
        params.insert(keys::SAFE_SEARCH, values::USE_SAFE_SEARCH);
        params.insert(keys::EXTRAS, values::MEDIUM_URL);
        params.insert(keys::FORMAT, values::RESPONSE_FORMAT);
        params.insert(keys::NO_JSON_CALLBACK, values::DISABLE_JSON_CALLBACK);
        params
    }
}

/// Combine an endpoint and parameters into a request URL.
///
/// Parameters appear in insertion order, and their values are form-urlencoded.
///
/// # Errors
/// [`SearchError::UrlConstruction`] if the endpoint does not form a valid
/// absolute URL with a host.
pub fn serialize_to_url(base: &Endpoint, params: &SearchParameters) -> Result<Url, SearchError> {
    let mut url = Url::parse(&format!("{}://{}", base.scheme, base.host))
        .context(format!("Building URL from {}://{}", base.scheme, base.host))
        .map_err(SearchError::UrlConstruction)?;

    if url.cannot_be_a_base() || url.host_str().map_or(true, str::is_empty) {
        return Err(SearchError::UrlConstruction(anyhow!(
            "{}://{} has no host",
            base.scheme,
            base.host
        )));
    }

    url.set_path(&base.path);
    url.query_pairs_mut().extend_pairs(params.iter());

    tracing::trace!(url = %redact_api_key(&url), "built search URL");
    Ok(url)
}

/// A copy of `url` that is safe to log, with the value of `api_key` replaced.
pub fn redact_api_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == keys::API_KEY {
                "<redacted>".into()
            } else {
                v
            };
            (k.into_owned(), v.into_owned())
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

#[cfg(test)]
mod tests {
    use super::{keys, redact_api_key, serialize_to_url, QueryBuilder};
    use crate::{Endpoint, SearchError, ValidationError};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn builder() -> QueryBuilder {
        QueryBuilder::new("secret", 1.0, 1.0)
    }

    fn flickr() -> Endpoint {
        Endpoint {
            scheme: "https".to_string(),
            host: "api.flickr.com".to_string(),
            path: "/services/rest".to_string(),
        }
    }

    #[test]
    fn phrase_query_has_text_and_no_bbox() {
        let params = builder().phrase_query("sunset").unwrap();

        assert_eq!(params.get(keys::TEXT), Some("sunset"));
        assert!(!params.contains_key(keys::BOUNDING_BOX));
        assert_eq!(
            params.iter().collect::<Vec<_>>(),
            vec![
                ("method", "flickr.photos.search"),
                ("api_key", "secret"),
                ("text", "sunset"),
                ("safe_search", "1"),
                ("extras", "url_m"),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ]
        );
    }

    #[test]
    fn blank_phrases_are_rejected() {
        for phrase in ["", " ", "\t\n"] {
            assert_eq!(
                builder().phrase_query(phrase),
                Err(ValidationError::EmptyInput)
            );
        }
    }

    #[test]
    fn phrase_is_not_trimmed() {
        let params = builder().phrase_query(" golden gate ").unwrap();
        assert_eq!(params.get(keys::TEXT), Some(" golden gate "));
    }

    #[test]
    fn location_query_has_bbox_and_no_text() {
        let params = builder().location_query(47.6, -122.3).unwrap();

        assert_eq!(
            params.get(keys::BOUNDING_BOX),
            Some("-123.3,46.6,-121.3,48.6")
        );
        assert!(!params.contains_key(keys::TEXT));
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn location_query_uses_configured_box_size() {
        let params = QueryBuilder::new("secret", 2.5, 0.5)
            .location_query(0.0, 0.0)
            .unwrap();
        assert_eq!(params.get(keys::BOUNDING_BOX), Some("-2.5,-0.5,2.5,0.5"));
    }

    #[test]
    fn location_out_of_range_is_rejected() {
        assert_eq!(
            builder().location_query(0.0, 181.0),
            Err(ValidationError::Range {
                latitude: 0.0,
                longitude: 181.0
            })
        );
    }

    #[test]
    fn url_contains_every_parameter() {
        let params = builder().phrase_query("sunset").unwrap();
        let url = serialize_to_url(&flickr(), &params).unwrap();

        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("api.flickr.com"));
        assert_eq!(url.path(), "/services/rest");

        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query.len(), 7);
        assert_eq!(query["text"], "sunset");
        assert_eq!(query["method"], "flickr.photos.search");
        assert!(!query.contains_key("bbox"));
    }

    #[test]
    fn url_values_are_encoded() {
        let params = builder().phrase_query("rock & roll?").unwrap();
        let url = serialize_to_url(&flickr(), &params).unwrap();

        assert!(url.as_str().contains("text=rock+%26+roll%3F"));
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["text"], "rock & roll?");

        let params = builder().location_query(47.6, -122.3).unwrap();
        let url = serialize_to_url(&flickr(), &params).unwrap();
        assert!(url.as_str().contains("bbox=-123.3%2C46.6%2C-121.3%2C48.6"));
    }

    #[test]
    fn url_host_may_have_a_port() {
        let endpoint = Endpoint {
            scheme: "http".to_string(),
            host: "127.0.0.1:8080".to_string(),
            path: "/services/rest".to_string(),
        };
        let url = serialize_to_url(&endpoint, &builder().phrase_query("x").unwrap()).unwrap();
        assert_eq!(url.port(), Some(8080));
    }

    #[test]
    fn bad_endpoints_are_rejected() {
        for (scheme, host) in [("https", ""), ("", "api.flickr.com"), ("ht tp", "x")] {
            let endpoint = Endpoint {
                scheme: scheme.to_string(),
                host: host.to_string(),
                path: "/services/rest".to_string(),
            };
            let res = serialize_to_url(&endpoint, &builder().phrase_query("x").unwrap());
            assert!(
                matches!(res, Err(SearchError::UrlConstruction(_))),
                "{:?} should fail",
                endpoint
            );
        }
    }

    #[test]
    fn api_key_is_redacted() {
        let params = QueryBuilder::new("s3cr3t", 1.0, 1.0)
            .phrase_query("a b")
            .unwrap();
        let url = serialize_to_url(&flickr(), &params).unwrap();
        let redacted = redact_api_key(&url);

        assert!(!redacted.as_str().contains("s3cr3t"));
        assert!(redacted.as_str().contains("api_key=%3Credacted%3E"));
        assert!(redacted.as_str().contains("text=a+b"));
        assert_eq!(redacted.path(), "/services/rest");
        assert!(url.as_str().contains("api_key=s3cr3t"));
    }
}
