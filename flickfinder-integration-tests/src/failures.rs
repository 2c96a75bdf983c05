//! Tests that every way a search can fail is reported, and leaves the session
//! ready for the next one.
#![cfg(test)]

use crate::{flickfinder_test, mock_image, photo, search_page, TestingTools, REST_PATH};
use anyhow::Result;
use flickfinder_search::SearchError;
use flickfinder_session::{SearchInput, SearchSession, SessionError};
use httpmock::MockServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;

/// Run a search that is expected to fail, and check what the session shows.
async fn search_fails(session: &SearchSession) -> SearchError {
    let res = session.search(SearchInput::phrase("anything")).await;
    assert_eq!(session.status(), "No photo returned.  Try again.");
    assert_eq!(session.displayed(), None);
    assert!(session.is_ready());
    match res {
        Err(SessionError::Search(error)) => error,
        other => panic!("expected a search error, got {:?}", other),
    }
}

/// Answer searches with `body`.
async fn respond_with(server: &MockServer, body: Value) {
    server
        .mock_async(|when, then| {
            when.path(REST_PATH);
            then.status(200).json_body(body);
        })
        .await;
}

#[tokio::test]
async fn server_error() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(500).body("Internal Server Error");
                })
                .await;

            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::HttpStatus(500)), "{:?}", error);
        },
    )
    .await
}

#[tokio::test]
async fn empty_body() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200);
                })
                .await;

            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::EmptyBody), "{:?}", error);
        },
    )
    .await
}

#[tokio::test]
async fn jsonp_body_is_a_parse_error() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200)
                        .body(r#"jsonFlickrApi({"stat":"ok","photos":{"photo":[]}})"#);
                })
                .await;

            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::Parse(_)), "{:?}", error);
        },
    )
    .await
}

#[tokio::test]
async fn api_failure_skips_the_image() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let payload = json!({ "stat": "fail", "code": 100, "message": "Invalid API Key (Key not found)" });
            respond_with(&flickr_mock, payload.clone()).await;
            let image_mock = mock_image(&flickr_mock, "/never.jpg").await;

            let error = search_fails(&session).await;

            match error {
                SearchError::ApiStatus(returned) => assert_eq!(returned, payload),
                other => panic!("expected ApiStatus, got {:?}", other),
            }
            image_mock.assert_hits_async(0).await;
        },
    )
    .await
}

#[tokio::test]
async fn missing_photo_list() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            respond_with(&flickr_mock, json!({ "stat": "ok", "photos": { "page": 1 } })).await;

            let error = search_fails(&session).await;
            assert!(
                matches!(error, SearchError::MissingField("photos.photo")),
                "{:?}",
                error
            );
        },
    )
    .await
}

#[tokio::test]
async fn no_results() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            respond_with(&flickr_mock, search_page(vec![])).await;

            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::NoResults), "{:?}", error);
        },
    )
    .await
}

#[tokio::test]
async fn photo_without_medium_url() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            respond_with(&flickr_mock, search_page(vec![json!({ "id": "1", "title": "tiny" })]))
                .await;

            let error = search_fails(&session).await;
            assert!(
                matches!(error, SearchError::MissingField("url_m")),
                "{:?}",
                error
            );
        },
    )
    .await
}

#[tokio::test]
async fn missing_image_replaces_the_previous_photo() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH).query_param("text", "first");
                    then.status(200).json_body(search_page(vec![photo(
                        Some("first"),
                        &flickr_mock.url("/first.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/first.jpg").await;

            session
                .search(SearchInput::phrase("first"))
                .await
                .expect("first search should succeed");
            assert!(session.displayed().is_some());

            respond_with(
                &flickr_mock,
                search_page(vec![photo(Some("gone"), &flickr_mock.url("/gone.jpg"))]),
            )
            .await;
            flickr_mock
                .mock_async(|when, then| {
                    when.path("/gone.jpg");
                    then.status(404);
                })
                .await;

            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::ImageFetch(_)), "{:?}", error);
        },
    )
    .await
}

#[tokio::test]
async fn slow_search_times_out() {
    flickfinder_test(
        |settings| settings.search.max_time = Duration::from_millis(200),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200)
                        .delay(Duration::from_secs(1))
                        .json_body(search_page(vec![]));
                })
                .await;

            let error = search_fails(&session).await;
            assert!(
                matches!(error, SearchError::TimedOut(t) if t == Duration::from_millis(200)),
                "{:?}",
                error
            );
        },
    )
    .await
}

#[tokio::test]
async fn unreachable_flickr_is_a_transport_error() {
    flickfinder_test(
        |settings| settings.flickr.host = "127.0.0.1:1".to_string(),
        |TestingTools { session, .. }| async move {
            let error = search_fails(&session).await;
            assert!(matches!(error, SearchError::Transport(_)), "{:?}", error);
        },
    )
    .await
}
