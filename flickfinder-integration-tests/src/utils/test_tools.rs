//! Tools for running tests

use crate::utils::logging::LogWatcher;
use flickfinder_flickr::FlickrClient;
use flickfinder_search::{QueryBuilder, TimeoutSource};
use flickfinder_session::SearchSession;
use flickfinder_settings::Settings;
use httpmock::MockServer;
use std::{future::Future, sync::Arc};
use tracing_futures::Instrument;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt};

/// Run a test with a fully configured search session.
///
/// Flickr is replaced by a mock server listening on a port assigned by the OS,
/// with no mocks registered. The session goes through the same client and
/// timeout wrapper the binary uses.
///
/// A suite of tools will be passed to the test function in the form of an
/// instance of [`TestingTools`].
///
/// # Example
///
/// ```
/// # use flickfinder_integration_tests::{flickfinder_test, TestingTools};
/// #[tokio::test]
/// async fn a_test() {
///     flickfinder_test(
///         |settings| settings.debug = false,
///         |TestingTools { session, flickr_mock, .. }| async move {
///             assert!(session.is_ready()) // Test goes here
///         }
///     ).await
/// }
/// ```
///
/// # Panics
/// May panic if tests could not be set up correctly.
pub async fn flickfinder_test<FSettings, FTest, Fut>(
    settings_changer: FSettings,
    test: FTest,
) -> Fut::Output
where
    FSettings: FnOnce(&mut Settings),
    FTest: Fn(TestingTools) -> Fut,
    Fut: Future,
{
    let test_span = tracing::info_span!("flickfinder_test");

    // Set up a mock server to stand in for Flickr
    let flickr_mock = MockServer::start_async().await;

    let settings = Settings::load_for_tests(|settings| {
        settings.flickr.host = flickr_mock.address().to_string();
        settings_changer(settings);
    });

    // Set up logging
    let log_watcher = LogWatcher::default();
    let log_watcher_writer = log_watcher.make_writer();

    let env_filter: tracing_subscriber::EnvFilter = (&settings.logging.levels).into();
    let tracing_subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(move || log_watcher_writer.clone()),
        )
        .with(tracing_subscriber::fmt::layer().pretty().with_test_writer());

    let _tracing_subscriber_guard = tracing::subscriber::set_default(tracing_subscriber);

    let flickr = FlickrClient::new_boxed(&settings.flickr).expect("Could not build Flickr client");
    let source = TimeoutSource::new_boxed(&settings.search, flickr);
    let session = Arc::new(SearchSession::new(
        QueryBuilder::from_settings(&settings),
        source,
    ));

    // Assemble the tools
    let tools = TestingTools {
        session,
        flickr_mock,
        log_watcher,
        settings,
    };
    // Run the test
    test(tools).instrument(test_span).await
}

/// What a test gets to work with.
///
/// Non-exhaustive, so destructuring needs a trailing `..` and tools can be
/// added without touching existing tests.
#[non_exhaustive]
pub struct TestingTools {
    /// A session wired to [`flickr_mock`](Self::flickr_mock).
    pub session: Arc<SearchSession>,

    /// A [`httpmock::MockServer`] that the session sends searches to. Does not
    /// contain mock responses, any needed must be added. Image URLs in mocked
    /// search responses can point back at it with [`MockServer::url`].
    pub flickr_mock: MockServer,

    /// To make assertions about logs.
    pub log_watcher: LogWatcher,

    /// The settings the session was built from.
    pub settings: Settings,
}
