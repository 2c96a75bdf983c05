//! Tests searching by phrase, end to end.
#![cfg(test)]

use crate::{
    fake_title, flickfinder_test, mock_image, photo, search_page, TestingTools, IMAGE_BYTES,
    REST_PATH,
};
use anyhow::Result;
use flickfinder_session::{SearchInput, SessionError};
use httpmock::Method::GET;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn phrase_search_returns_a_titled_photo() -> Result<()> {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             settings,
             ..
         }| async move {
            let title = fake_title();
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.method(GET)
                        .path(REST_PATH)
                        .query_param("method", "flickr.photos.search")
                        .query_param("api_key", settings.flickr.api_key.as_str())
                        .query_param("text", "golden gate bridge")
                        .query_param("safe_search", "1")
                        .query_param("extras", "url_m")
                        .query_param("format", "json")
                        .query_param("nojsoncallback", "1");
                    then.status(200).json_body(search_page(vec![photo(
                        Some(title.as_str()),
                        &flickr_mock.url("/65535/1_m.jpg"),
                    )]));
                })
                .await;
            let image_mock = mock_image(&flickr_mock, "/65535/1_m.jpg").await;

            let result = session
                .search(SearchInput::phrase("golden gate bridge"))
                .await?;

            search_mock.assert_async().await;
            image_mock.assert_async().await;
            assert_eq!(result.title.as_deref(), Some(title.as_str()));
            assert_eq!(result.image, IMAGE_BYTES);
            assert_eq!(session.status(), title);
            assert_eq!(session.displayed(), Some(result));
            assert!(session.is_ready());

            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn untitled_photo_leaves_status_blank() -> Result<()> {
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
                    then.status(200).json_body(search_page(vec![photo(
                        None,
                        &flickr_mock.url("/untitled.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/untitled.jpg").await;

            let result = session.search(SearchInput::phrase("fog")).await?;

            assert_eq!(result.title, None);
            assert_eq!(session.status(), "");
            assert!(session.displayed().is_some());

            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn blank_phrase_sends_nothing() -> Result<()> {
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
                    then.status(500);
                })
                .await;

            for phrase in ["", "  ", "\t"] {
                let res = session.search(SearchInput::phrase(phrase)).await;
                assert!(matches!(res, Err(SessionError::Validation(_))));
                assert_eq!(session.status(), "Phrase Empty.");
            }

            search_mock.assert_hits_async(0).await;
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn phrase_is_sent_untrimmed_and_encoded() -> Result<()> {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH).query_param("text", " rock & roll? ");
                    then.status(200).json_body(search_page(vec![photo(
                        Some("on stage"),
                        &flickr_mock.url("/stage.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/stage.jpg").await;

            session.search(SearchInput::phrase(" rock & roll? ")).await?;

            search_mock.assert_async().await;
            Ok(())
        },
    )
    .await
}
