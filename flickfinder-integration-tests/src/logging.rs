//! Tests that searches are logged usefully, and without secrets.
#![cfg(test)]

use crate::{flickfinder_test, mock_image, photo, search_page, TestingTools, REST_PATH};
use flickfinder_session::SearchInput;
use tracing::Level;

#[tokio::test]
async fn api_key_never_reaches_the_logs() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             mut log_watcher,
             settings,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200).json_body(search_page(vec![photo(
                        Some("quiet"),
                        &flickr_mock.url("/quiet.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/quiet.jpg").await;

            session
                .search(SearchInput::phrase("secrets"))
                .await
                .expect("search should succeed");

            let api_key = settings.flickr.api_key.as_str();
            assert!(log_watcher.has(|event| event.field_contains("url", "api_key=%3Credacted%3E")));
            assert!(!log_watcher.has(|event| event.any_field_contains(api_key)));
            assert!(log_watcher.has(|event| event.field_contains("message", "found photo")
                && event.field_contains("title", "quiet")));
        },
    )
    .await
}

#[tokio::test]
async fn failures_are_logged_as_warnings() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             mut log_watcher,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(503);
                })
                .await;

            session.search(SearchInput::phrase("outage")).await.ok();

            assert!(log_watcher.has(|event| event.level == Level::WARN
                && event.field_contains("message", "search failed")
                && event.field_contains("error", "503")));
        },
    )
    .await
}

#[tokio::test]
async fn api_key_stays_out_of_trace_logs() {
    flickfinder_test(
        |settings| settings.logging.levels = "TRACE,hyper=WARN".parse().unwrap(),
        |TestingTools {
             session,
             flickr_mock,
             mut log_watcher,
             settings,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200).json_body(search_page(vec![photo(
                        Some("verbose"),
                        &flickr_mock.url("/verbose.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/verbose.jpg").await;

            session
                .search(SearchInput::phrase("secrets"))
                .await
                .expect("search should succeed");

            let api_key = settings.flickr.api_key.as_str();
            assert!(log_watcher.has(|event| event.level == Level::TRACE
                && event.field_contains("message", "built search URL")));
            assert!(!log_watcher.has(|event| event.any_field_contains(api_key)));
        },
    )
    .await
}
