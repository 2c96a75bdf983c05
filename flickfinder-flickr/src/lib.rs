#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! A photo source backed by the Flickr REST API.
//!
//! A search is two dependent requests: `flickr.photos.search` with the
//! parameters from the query builder, and then a download of the medium sized
//! image of one photo picked at random from the results. Every step that can
//! fail maps to its own [`SearchError`] variant.

pub mod response;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use flickfinder_search::{
    query::{keys, redact_api_key},
    serialize_to_url, Endpoint, IndexSelector, PhotoResult, PhotoSource,
    SearchError, SearchParameters, SetupError, ThreadRngSelector,
};
use flickfinder_settings::FlickrSettings;
use reqwest::Url;
use std::sync::Arc;
use tracing::Instrument;

pub use crate::response::PhotoRecord;

/// Searches Flickr and downloads one of the photos found.
pub struct FlickrClient {
    /// The client that will be used to make http requests.
    reqwest_client: reqwest::Client,

    /// Where to send searches.
    endpoint: Endpoint,

    /// Picks one photo out of the results.
    selector: Arc<dyn IndexSelector>,
}

impl FlickrClient {
    /// Make a client from settings. Photos are picked with [`ThreadRngSelector`].
    ///
    /// # Errors
    /// If the endpoint settings do not form a URL, or the HTTP client cannot be
    /// built.
    pub fn new(settings: &FlickrSettings) -> Result<Self, SetupError> {
        let endpoint = Endpoint::from(settings);
        serialize_to_url(&endpoint, &SearchParameters::new())
            .context("Checking the Flickr endpoint")
            .map_err(SetupError::InvalidConfiguration)?;

        let reqwest_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Unable to create the Reqwest client")
            .map_err(SetupError::Network)?;

        Ok(Self {
            reqwest_client,
            endpoint,
            selector: Arc::new(ThreadRngSelector),
        })
    }

    /// Make a boxed client from settings.
    ///
    /// # Errors
    /// See [`FlickrClient::new`].
    pub fn new_boxed(settings: &FlickrSettings) -> Result<Box<Self>, SetupError> {
        Self::new(settings).map(Box::new)
    }

    /// Replace the way photos are picked out of the results.
    #[must_use]
    pub fn with_selector(mut self, selector: Arc<dyn IndexSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Run the search request and return the body. Covers transport failures,
    /// non-2xx statuses and empty bodies.
    async fn search(&self, url: Url) -> Result<Vec<u8>, SearchError> {
        tracing::debug!(url = %redact_api_key(&url), "searching Flickr");

        let response = self
            .reqwest_client
            .get(url)
            .send()
            .await
            .context("Performing Flickr search request")
            .map_err(SearchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .context("Reading Flickr search response")
            .map_err(SearchError::Transport)?;

        if body.is_empty() {
            return Err(SearchError::EmptyBody);
        }

        Ok(body.to_vec())
    }

    /// Download the image of the chosen photo.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, SearchError> {
        tracing::debug!(%image_url, "downloading photo");

        let url = Url::parse(image_url)
            .context(format!("Photo URL is invalid: {}", image_url))
            .map_err(SearchError::ImageFetch)?;

        let response = self
            .reqwest_client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .context(format!("Downloading photo: {}", image_url))
            .map_err(SearchError::ImageFetch)?;

        let image = response
            .bytes()
            .await
            .context(format!("Reading photo: {}", image_url))
            .map_err(SearchError::ImageFetch)?;

        if image.is_empty() {
            return Err(SearchError::ImageFetch(anyhow!(
                "Photo has no content: {}",
                image_url
            )));
        }

        Ok(image.to_vec())
    }

    /// Every step of a search, without logging the outcome.
    async fn run(&self, params: SearchParameters) -> Result<PhotoResult, SearchError> {
        let url = serialize_to_url(&self.endpoint, &params)?;
        let body = self.search(url).await?;
        let PhotoRecord { title, medium_url } =
            response::choose_photo(&body, self.selector.as_ref())?;
        let image = self.fetch_image(&medium_url).await?;

        Ok(PhotoResult {
            title,
            image_url: medium_url,
            image,
        })
    }
}

#[async_trait]
impl PhotoSource for FlickrClient {
    fn name(&self) -> String {
        "FlickrClient".to_owned()
    }

    async fn fetch_random_photo(
        &self,
        params: SearchParameters,
    ) -> Result<PhotoResult, SearchError> {
        let span = tracing::info_span!(
            "flickr-search",
            text = params.get(keys::TEXT),
            bbox = params.get(keys::BOUNDING_BOX),
        );

        async move {
            let result = self.run(params).await;
            match &result {
                Ok(photo) => tracing::info!(
                    title = photo.title.as_deref().unwrap_or(""),
                    image_url = %photo.image_url,
                    bytes = photo.image.len(),
                    "found photo"
                ),
                Err(error) => tracing::warn!(%error, "search failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::FlickrClient;
    use anyhow::Result;
    use flickfinder_search::{
        PhotoSource, QueryBuilder, SearchError, SearchParameters, SeededSelector,
    };
    use flickfinder_settings::FlickrSettings;
    use httpmock::{Method::GET, MockServer};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc, time::Duration};

    const IMAGE: &[u8] = b"\xFF\xD8\xFF\xE0 not really a jpeg";

    fn settings_for(host: String) -> FlickrSettings {
        FlickrSettings {
            scheme: "http".to_string(),
            host,
            path: "/services/rest".to_string(),
            api_key: "test-key".to_string(),
            user_agent: "flickfinder-tests".to_string(),
            request_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(500),
        }
    }

    fn client_for(server: &MockServer) -> FlickrClient {
        FlickrClient::new(&settings_for(server.address().to_string()))
            .expect("client should build")
            .with_selector(Arc::new(SeededSelector::new(1)))
    }

    fn sunset() -> SearchParameters {
        QueryBuilder::new("test-key", 1.0, 1.0)
            .phrase_query("sunset")
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetches_title_and_image() -> Result<()> {
        let server = MockServer::start_async().await;
        let search_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/services/rest")
                    .query_param("method", "flickr.photos.search")
                    .query_param("api_key", "test-key")
                    .query_param("text", "sunset")
                    .query_param("safe_search", "1")
                    .query_param("extras", "url_m")
                    .query_param("format", "json")
                    .query_param("nojsoncallback", "1");
                then.status(200).json_body(json!({
                    "stat": "ok",
                    "photos": { "photo": [
                        { "title": "Golden hour", "url_m": server.url("/photos/1.jpg") }
                    ]}
                }));
            })
            .await;
        let image_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/photos/1.jpg");
                then.status(200).body(IMAGE);
            })
            .await;

        let photo = client_for(&server).fetch_random_photo(sunset()).await?;

        search_mock.assert_async().await;
        image_mock.assert_async().await;
        assert_eq!(photo.title.as_deref(), Some("Golden hour"));
        assert_eq!(photo.image_url, server.url("/photos/1.jpg"));
        assert_eq!(photo.image, IMAGE);
        Ok(())
    }

    #[tokio::test]
    async fn test_location_search_sends_bbox() -> Result<()> {
        let server = MockServer::start_async().await;
        let search_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/services/rest")
                    .query_param("bbox", "-123.3,46.6,-121.3,48.6");
                then.status(200).json_body(json!({
                    "stat": "ok",
                    "photos": { "photo": [{ "url_m": server.url("/photos/2.jpg") }] }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/photos/2.jpg");
                then.status(200).body(IMAGE);
            })
            .await;

        let params = QueryBuilder::new("test-key", 1.0, 1.0).location_query(47.6, -122.3)?;
        let photo = client_for(&server).fetch_random_photo(params).await?;

        search_mock.assert_async().await;
        assert_eq!(photo.title, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_2xx_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(503);
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::HttpStatus(503))), "{:?}", res);
    }

    #[tokio::test]
    async fn test_empty_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200);
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::EmptyBody)), "{:?}", res);
    }

    #[tokio::test]
    async fn test_failed_status_skips_image() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200).json_body(json!({
                    "stat": "fail", "code": 100, "message": "Invalid API Key"
                }));
            })
            .await;
        let image_mock = server
            .mock_async(|when, then| {
                when.path_contains("/photos/");
                then.status(200).body(IMAGE);
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;

        assert!(matches!(res, Err(SearchError::ApiStatus(_))), "{:?}", res);
        image_mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_no_results() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200)
                    .json_body(json!({ "stat": "ok", "photos": { "photo": [] } }));
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::NoResults)), "{:?}", res);
    }

    #[tokio::test]
    async fn test_image_fetch_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200).json_body(json!({
                    "stat": "ok",
                    "photos": { "photo": [{ "title": "gone", "url_m": server.url("/photos/404.jpg") }] }
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/photos/404.jpg");
                then.status(404);
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::ImageFetch(_))), "{:?}", res);
    }

    #[tokio::test]
    async fn test_invalid_image_url() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200).json_body(json!({
                    "stat": "ok",
                    "photos": { "photo": [{ "url_m": "not a url" }] }
                }));
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::ImageFetch(_))), "{:?}", res);
    }

    #[tokio::test]
    async fn test_slow_server_is_a_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/services/rest");
                then.status(200)
                    .delay(Duration::from_secs(2))
                    .json_body(json!({ "stat": "ok", "photos": { "photo": [] } }));
            })
            .await;

        let res = client_for(&server).fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::Transport(_))), "{:?}", res);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        // Find a port that nothing listens on.
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = FlickrClient::new(&settings_for(address.to_string())).unwrap();

        let res = client.fetch_random_photo(sunset()).await;
        assert!(matches!(res, Err(SearchError::Transport(_))), "{:?}", res);
    }

    #[test]
    fn bad_endpoint_is_a_setup_error() {
        assert!(FlickrClient::new(&settings_for(String::new())).is_err());
    }
}
