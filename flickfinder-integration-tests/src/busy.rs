//! Tests that a session runs one search at a time.
#![cfg(test)]

use crate::{flickfinder_test, mock_image, photo, search_page, TestingTools, REST_PATH};
use flickfinder_session::{SearchInput, SessionError};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::runtime::Handle;

#[tokio::test]
async fn second_search_is_refused_while_the_first_runs() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200)
                        .delay(Duration::from_millis(300))
                        .json_body(search_page(vec![photo(
                            Some("patience"),
                            &flickr_mock.url("/slow.jpg"),
                        )]));
                })
                .await;
            mock_image(&flickr_mock, "/slow.jpg").await;

            let running = session
                .submit(&Handle::current(), SearchInput::phrase("first"))
                .expect("session should be idle");
            assert!(!session.is_ready());

            let refused = session.search(SearchInput::phrase("second")).await;
            assert!(matches!(refused, Err(SessionError::Busy)), "{:?}", refused);

            let result = running
                .await
                .expect("search task panicked")
                .expect("search should succeed");
            assert_eq!(result.title.as_deref(), Some("patience"));
            assert_eq!(session.status(), "patience");
            assert!(session.is_ready());
            search_mock.assert_hits_async(1).await;

            session
                .search(SearchInput::phrase("third"))
                .await
                .expect("session should accept a new search");
            search_mock.assert_hits_async(2).await;
        },
    )
    .await
}

#[tokio::test]
async fn session_is_ready_after_a_failed_submit() {
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
                    then.status(502);
                })
                .await;

            let outcome = session
                .submit(&Handle::current(), SearchInput::phrase("x"))
                .expect("session should be idle")
                .await
                .expect("search task panicked");

            assert!(matches!(outcome, Err(SessionError::Search(_))));
            assert_eq!(session.status(), "No photo returned.  Try again.");
            assert!(session.is_ready());
        },
    )
    .await
}
