//! Tests searching around a point, end to end.
#![cfg(test)]

use crate::{flickfinder_test, mock_image, photo, search_page, TestingTools, REST_PATH};
use anyhow::Result;
use flickfinder_session::{SearchInput, SessionError};
use httpmock::Method::GET;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn location_search_sends_a_bounding_box() -> Result<()> {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.method(GET)
                        .path(REST_PATH)
                        .query_param("bbox", "-123.3,46.6,-121.3,48.6")
                        .query_param("safe_search", "1")
                        .query_param("extras", "url_m");
                    then.status(200).json_body(search_page(vec![photo(
                        Some("Space Needle"),
                        &flickr_mock.url("/needle.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/needle.jpg").await;

            let result = session
                .search(SearchInput::location("47.6", "-122.3"))
                .await?;

            search_mock.assert_async().await;
            assert_eq!(result.title.as_deref(), Some("Space Needle"));

            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn box_size_comes_from_settings() -> Result<()> {
    flickfinder_test(
        |settings| {
            settings.search.bbox_half_width = 0.5;
            settings.search.bbox_half_height = 0.25;
        },
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH).query_param("bbox", "9.5,19.75,10.5,20.25");
                    then.status(200).json_body(search_page(vec![photo(
                        None,
                        &flickr_mock.url("/small.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/small.jpg").await;

            session.search(SearchInput::location("20", "10")).await?;

            search_mock.assert_async().await;
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn box_is_clamped_at_the_poles_and_antimeridian() -> Result<()> {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let search_mock = flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH).query_param("bbox", "179,89,180,90");
                    then.status(200).json_body(search_page(vec![photo(
                        None,
                        &flickr_mock.url("/north.jpg"),
                    )]));
                })
                .await;
            mock_image(&flickr_mock, "/north.jpg").await;

            session.search(SearchInput::location("90", "180")).await?;

            search_mock.assert_async().await;
            Ok(())
        },
    )
    .await
}

#[tokio::test]
async fn bad_coordinates_send_nothing() {
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

            for (latitude, longitude) in [
                ("90.1", "0"),
                ("-90.1", "0"),
                ("0", "180.1"),
                ("0", "-181"),
                ("", ""),
                ("12", "east"),
                ("NaN", "0"),
            ] {
                let res = session
                    .search(SearchInput::location(latitude, longitude))
                    .await;

                assert!(
                    matches!(res, Err(SessionError::Validation(_))),
                    "({:?}, {:?}): {:?}",
                    latitude,
                    longitude,
                    res
                );
                assert_eq!(
                    session.status(),
                    "Lat should be [-90, 90].\nLon should be [-180, 180]."
                );
            }

            search_mock.assert_hits_async(0).await;
        },
    )
    .await
}
