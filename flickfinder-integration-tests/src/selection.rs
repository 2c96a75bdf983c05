//! Tests that a search picks among all of the photos Flickr returns.
#![cfg(test)]

use crate::{flickfinder_test, mock_image, photo, search_page, TestingTools, REST_PATH};
use flickfinder_session::SearchInput;
use serde_json::Value;
use std::collections::HashSet;

#[tokio::test]
async fn every_photo_can_be_chosen() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let paths = ["/a.jpg", "/b.jpg", "/c.jpg"];
            let urls: Vec<String> = paths.iter().map(|path| flickr_mock.url(*path)).collect();
            let photos: Vec<Value> = paths
                .iter()
                .zip(&urls)
                .map(|(path, url)| photo(Some(*path), url))
                .collect();
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200).json_body(search_page(photos));
                })
                .await;
            for path in paths {
                mock_image(&flickr_mock, path).await;
            }

            let mut chosen = HashSet::new();
            for _ in 0..60 {
                let result = session
                    .search(SearchInput::phrase("letters"))
                    .await
                    .expect("search should succeed");
                assert!(urls.contains(&result.image_url), "{}", result.image_url);
                chosen.insert(result.title.expect("every photo has a title"));
            }

            // A uniform choice misses one of three photos in 60 draws with
            // probability below 1e-10.
            assert_eq!(chosen.len(), paths.len(), "chosen: {:?}", chosen);
        },
    )
    .await
}

#[tokio::test]
async fn title_matches_the_downloaded_image() {
    flickfinder_test(
        |_| (),
        |TestingTools {
             session,
             flickr_mock,
             ..
         }| async move {
            let photos: Vec<Value> = (0..5)
                .map(|i| {
                    let path = format!("/{}.jpg", i);
                    photo(Some(path.as_str()), &flickr_mock.url(&path))
                })
                .collect();
            flickr_mock
                .mock_async(|when, then| {
                    when.path(REST_PATH);
                    then.status(200).json_body(search_page(photos));
                })
                .await;
            for i in 0..5 {
                mock_image(&flickr_mock, &format!("/{}.jpg", i)).await;
            }

            for _ in 0..10 {
                let result = session
                    .search(SearchInput::phrase("numbers"))
                    .await
                    .expect("search should succeed");
                let title = result.title.expect("every photo has a title");
                assert!(result.image_url.ends_with(&title), "{} {}", title, result.image_url);
            }
        },
    )
    .await
}
