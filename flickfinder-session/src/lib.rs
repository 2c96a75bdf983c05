#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! The state behind a FlickFinder search screen.
//!
//! A [`SearchSession`] takes what the user typed, runs at most one search at a
//! time, and keeps the status text and the photo to display. Whatever happens
//! to a search, the session is ready for the next one when it ends.

mod errors;

use flickfinder_search::{Coordinates, PhotoResult, PhotoSource, QueryBuilder, SearchParameters};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError, RwLock,
};
use tokio::{runtime::Handle, task::JoinHandle};

pub use crate::errors::{SessionError, BAD_COORDINATES, NO_PHOTO, PHRASE_EMPTY, SEARCHING};

/// What the user asked to search for, as typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchInput {
    /// Free text.
    Phrase(String),

    /// A point, from two text fields.
    Location {
        /// Degrees north.
        latitude: String,
        /// Degrees east.
        longitude: String,
    },
}

impl SearchInput {
    /// Search for free text.
    pub fn phrase<S: Into<String>>(phrase: S) -> Self {
        Self::Phrase(phrase.into())
    }

    /// Search around a point.
    pub fn location<S: Into<String>, T: Into<String>>(latitude: S, longitude: T) -> Self {
        Self::Location {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// What the screen shows.
#[derive(Debug, Default)]
struct Display {
    /// The status line.
    status: String,
    /// The last photo found, if the last search found one.
    photo: Option<PhotoResult>,
}

/// Holds the busy flag for as long as it lives.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    /// Take the flag, or `None` if it is already taken.
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs searches one at a time and tracks what to show.
pub struct SearchSession {
    /// Turns input into search parameters.
    builder: QueryBuilder,

    /// Where photos come from.
    source: Box<dyn PhotoSource>,

    /// Set while a search is running.
    busy: Arc<AtomicBool>,

    /// The status text and the displayed photo.
    display: RwLock<Display>,
}

impl SearchSession {
    /// Make an idle session.
    pub fn new(builder: QueryBuilder, source: Box<dyn PhotoSource>) -> Self {
        Self {
            builder,
            source,
            busy: Arc::new(AtomicBool::new(false)),
            display: RwLock::new(Display::default()),
        }
    }

    /// Run a search and wait for it.
    ///
    /// # Errors
    /// [`SessionError::Busy`] without touching any state if a search is already
    /// running. Otherwise the error that ended the search, whose
    /// [`SessionError::user_message`] is now the status.
    pub async fn search(&self, input: SearchInput) -> Result<PhotoResult, SessionError> {
        let guard = BusyGuard::acquire(&self.busy).ok_or(SessionError::Busy)?;
        self.run(guard, input).await
    }

    /// Start a search on `runtime` and return right away.
    ///
    /// The session is busy as soon as this returns `Ok`. The returned handle
    /// resolves to the same outcome [`SearchSession::search`] would have.
    ///
    /// # Errors
    /// [`SessionError::Busy`] if a search is already running.
    pub fn submit(
        self: &Arc<Self>,
        runtime: &Handle,
        input: SearchInput,
    ) -> Result<JoinHandle<Result<PhotoResult, SessionError>>, SessionError> {
        let guard = BusyGuard::acquire(&self.busy).ok_or(SessionError::Busy)?;
        let session = Arc::clone(self);
        Ok(runtime.spawn(async move { session.run(guard, input).await }))
    }

    /// Whether a new search would be accepted.
    pub fn is_ready(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    /// The status line.
    pub fn status(&self) -> String {
        self.read_display().status.clone()
    }

    /// The photo on screen, if any.
    pub fn displayed(&self) -> Option<PhotoResult> {
        self.read_display().photo.clone()
    }

    /// Run a search while holding the busy flag, and record its outcome.
    async fn run(&self, _guard: BusyGuard, input: SearchInput) -> Result<PhotoResult, SessionError> {
        self.write_display().status = SEARCHING.to_string();

        let outcome = self.find_photo(&input).await;

        let mut display = self.write_display();
        match &outcome {
            Ok(photo) => {
                display.status = photo.title.clone().unwrap_or_default();
                display.photo = Some(photo.clone());
            }
            Err(error @ SessionError::Search(_)) => {
                tracing::info!(%error, "no photo for search");
                display.status = error.user_message().to_string();
                display.photo = None;
            }
            Err(error) => {
                tracing::debug!(%error, ?input, "rejected search input");
                display.status = error.user_message().to_string();
            }
        }

        outcome
    }

    /// Validate the input and ask the source for a photo.
    async fn find_photo(&self, input: &SearchInput) -> Result<PhotoResult, SessionError> {
        let params = self.parameters(input)?;
        Ok(self.source.fetch_random_photo(params).await?)
    }

    /// The search parameters for `input`.
    fn parameters(&self, input: &SearchInput) -> Result<SearchParameters, SessionError> {
        let params = match input {
            SearchInput::Phrase(phrase) => self.builder.phrase_query(phrase)?,
            SearchInput::Location {
                latitude,
                longitude,
            } => {
                let center = Coordinates::from_text(latitude, longitude)?;
                self.builder
                    .location_query(center.latitude(), center.longitude())?
            }
        };
        Ok(params)
    }

    /// Read access to the display. The display is valid after any panic.
    fn read_display(&self) -> std::sync::RwLockReadGuard<'_, Display> {
        self.display.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the display.
    fn write_display(&self) -> std::sync::RwLockWriteGuard<'_, Display> {
        self.display.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchInput, SearchSession, SessionError};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use flickfinder_search::{
        query::keys, PhotoResult, PhotoSource, QueryBuilder, SearchError, SearchParameters,
    };
    use pretty_assertions::assert_eq;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use tokio::{runtime::Handle, sync::Notify};

    /// How a [`ScriptedSource`] answers.
    #[derive(Clone, Copy)]
    enum Script {
        Photo(Option<&'static str>),
        NoResults,
        ImageFails,
        Panic,
    }

    /// A source that answers each call with the next step of a script, repeating
    /// the last step, and optionally waits for a signal first.
    struct ScriptedSource {
        script: Vec<Script>,
        gate: Option<Arc<Notify>>,
        calls: Arc<AtomicUsize>,
        last_params: Arc<Mutex<Option<SearchParameters>>>,
    }

    #[async_trait]
    impl PhotoSource for ScriptedSource {
        fn name(&self) -> String {
            "ScriptedSource".to_string()
        }

        async fn fetch_random_photo(
            &self,
            params: SearchParameters,
        ) -> Result<PhotoResult, SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script[call.min(self.script.len() - 1)];
            *self.last_params.lock().unwrap() = Some(params);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match step {
                Script::Photo(title) => Ok(PhotoResult {
                    title: title.map(ToString::to_string),
                    image_url: "https://example.com/1.jpg".to_string(),
                    image: vec![1, 2, 3],
                }),
                Script::NoResults => Err(SearchError::NoResults),
                Script::ImageFails => Err(SearchError::ImageFetch(anyhow!("404"))),
                Script::Panic => panic!("source blew up"),
            }
        }
    }

    struct Harness {
        session: Arc<SearchSession>,
        calls: Arc<AtomicUsize>,
        last_params: Arc<Mutex<Option<SearchParameters>>>,
    }

    fn harness(script: &[Script], gate: Option<Arc<Notify>>) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_params = Arc::new(Mutex::new(None));
        let source = ScriptedSource {
            script: script.to_vec(),
            gate,
            calls: Arc::clone(&calls),
            last_params: Arc::clone(&last_params),
        };
        let session = SearchSession::new(QueryBuilder::new("key", 1.0, 1.0), Box::new(source));
        Harness {
            session: Arc::new(session),
            calls,
            last_params,
        }
    }

    #[tokio::test]
    async fn success_shows_title_and_photo() {
        let h = harness(&[Script::Photo(Some("Golden Gate"))], None);

        let photo = h.session.search(SearchInput::phrase("bridge")).await.unwrap();

        assert_eq!(photo.title.as_deref(), Some("Golden Gate"));
        assert_eq!(h.session.status(), "Golden Gate");
        assert_eq!(h.session.displayed(), Some(photo));
        assert!(h.session.is_ready());
        let params = h.last_params.lock().unwrap().clone().unwrap();
        assert_eq!(params.get(keys::TEXT), Some("bridge"));
    }

    #[tokio::test]
    async fn untitled_photo_has_empty_status() {
        let h = harness(&[Script::Photo(None)], None);
        h.session.search(SearchInput::phrase("x")).await.unwrap();
        assert_eq!(h.session.status(), "");
        assert!(h.session.displayed().is_some());
    }

    #[tokio::test]
    async fn location_search_sends_bbox() {
        let h = harness(&[Script::Photo(Some("Seattle"))], None);
        h.session
            .search(SearchInput::location(" 47.6", "-122.3 "))
            .await
            .unwrap();

        let params = h.last_params.lock().unwrap().clone().unwrap();
        assert_eq!(params.get(keys::BOUNDING_BOX), Some("-123.3,46.6,-121.3,48.6"));
        assert!(!params.contains_key(keys::TEXT));
    }

    #[tokio::test]
    async fn empty_phrase_is_not_sent() {
        let h = harness(&[Script::Photo(Some("never"))], None);

        let res = h.session.search(SearchInput::phrase("   ")).await;

        assert!(matches!(res, Err(SessionError::Validation(_))));
        assert_eq!(h.session.status(), "Phrase Empty.");
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
        assert!(h.session.is_ready());
    }

    #[tokio::test]
    async fn bad_coordinates_are_not_sent() {
        let h = harness(&[Script::Photo(Some("never"))], None);

        for (lat, lon) in [("91", "0"), ("0", "-180.5"), ("", "10"), ("north", "10")] {
            let res = h.session.search(SearchInput::location(lat, lon)).await;
            assert!(matches!(res, Err(SessionError::Validation(_))), "{} {}", lat, lon);
            assert_eq!(
                h.session.status(),
                "Lat should be [-90, 90].\nLon should be [-180, 180]."
            );
        }
        assert_eq!(h.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_search_clears_the_photo() {
        for failure in [Script::NoResults, Script::ImageFails] {
            let h = harness(&[Script::Photo(Some("first")), failure], None);
            h.session.search(SearchInput::phrase("a")).await.unwrap();
            assert!(h.session.displayed().is_some());

            let res = h.session.search(SearchInput::phrase("b")).await;

            assert!(matches!(res, Err(SessionError::Search(_))));
            assert_eq!(h.session.status(), "No photo returned.  Try again.");
            assert_eq!(h.session.displayed(), None);
            assert!(h.session.is_ready());
        }
    }

    #[tokio::test]
    async fn image_failure_is_surfaced() {
        let h = harness(&[Script::ImageFails], None);
        let res = h.session.search(SearchInput::phrase("a")).await;
        assert!(matches!(
            res,
            Err(SessionError::Search(SearchError::ImageFetch(_)))
        ));
    }

    #[tokio::test]
    async fn overlapping_searches_are_refused() {
        let gate = Arc::new(Notify::new());
        let h = harness(&[Script::Photo(Some("slow"))], Some(Arc::clone(&gate)));

        let first = h
            .session
            .submit(&Handle::current(), SearchInput::phrase("first"))
            .unwrap();
        assert!(!h.session.is_ready());

        let second = h.session.search(SearchInput::phrase("second")).await;
        assert!(matches!(second, Err(SessionError::Busy)));
        assert!(matches!(
            h.session.submit(&Handle::current(), SearchInput::phrase("third")),
            Err(SessionError::Busy)
        ));

        gate.notify_one();
        let photo = first.await.unwrap().unwrap();

        assert_eq!(photo.title.as_deref(), Some("slow"));
        assert_eq!(h.session.status(), "slow");
        assert_eq!(h.calls.load(Ordering::SeqCst), 1);
        assert!(h.session.is_ready());
    }

    #[tokio::test]
    async fn status_reads_searching_while_running() {
        let gate = Arc::new(Notify::new());
        let h = harness(&[Script::Photo(Some("done"))], Some(Arc::clone(&gate)));

        let handle = h
            .session
            .submit(&Handle::current(), SearchInput::phrase("x"))
            .unwrap();
        while h.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(h.session.status(), "Searching...");
        gate.notify_one();
        handle.await.unwrap().unwrap();
        assert_eq!(h.session.status(), "done");
    }

    #[tokio::test]
    async fn panicking_source_releases_the_session() {
        let h = harness(&[Script::Panic], None);

        let handle = h
            .session
            .submit(&Handle::current(), SearchInput::phrase("x"))
            .unwrap();

        assert!(handle.await.unwrap_err().is_panic());
        assert!(h.session.is_ready());
    }

    #[tokio::test]
    async fn cancelled_search_releases_the_session() {
        let gate = Arc::new(Notify::new());
        let h = harness(&[Script::Photo(None)], Some(gate));

        let handle = h
            .session
            .submit(&Handle::current(), SearchInput::phrase("x"))
            .unwrap();
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert!(h.session.is_ready());
    }
}
