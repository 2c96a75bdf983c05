//! Tools to make sure a search doesn't take an excessive amount of time.

use crate::{PhotoResult, PhotoSource, SearchError, SearchParameters};
use async_trait::async_trait;
use flickfinder_settings::SearchSettings;
use std::time::Duration;

/// A combinator source that gives up if the wrapped source takes too long.
///
/// The limit covers everything the inner source does, so for Flickr it bounds
/// the search and the image download together.
pub struct TimeoutSource {
    /// The time to wait before giving up.
    max_time: Duration,

    /// The source to pull photos from.
    inner: Box<dyn PhotoSource>,
}

impl TimeoutSource {
    /// Construct a new, boxed timeout source.
    #[must_use]
    pub fn new_boxed(settings: &SearchSettings, inner: Box<dyn PhotoSource>) -> Box<Self> {
        Box::new(Self {
            max_time: settings.max_time,
            inner,
        })
    }
}

#[async_trait]
impl PhotoSource for TimeoutSource {
    fn name(&self) -> String {
        format!("timeout({})", self.inner.name())
    }

    async fn fetch_random_photo(
        &self,
        params: SearchParameters,
    ) -> Result<PhotoResult, SearchError> {
        let inner_fut = self.inner.fetch_random_photo(params);
        tokio::time::timeout(self.max_time, inner_fut)
            .await
            .unwrap_or_else(|_elapsed| {
                tracing::warn!(source = %self.inner.name(), max_time = ?self.max_time, "search timed out");
                Err(SearchError::TimedOut(self.max_time))
            })
    }
}
