//! Canned Flickr responses.

use fake::{faker::lorem::en::Words, Fake};
use httpmock::{Mock, MockServer};
use serde_json::{json, Value};

/// Where the client sends searches, as configured in `config/base.yaml`.
pub const REST_PATH: &str = "/services/rest";

/// Bytes served as every mock image.
pub const IMAGE_BYTES: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF";

/// A successful search response containing `photos`.
pub fn search_page(photos: Vec<Value>) -> Value {
    let total = photos.len().to_string();
    json!({
        "stat": "ok",
        "photos": {
            "page": 1,
            "pages": 1,
            "perpage": 250,
            "total": total,
            "photo": photos,
        }
    })
}

/// One entry of `photos.photo`.
pub fn photo(title: Option<&str>, medium_url: &str) -> Value {
    let mut photo = json!({
        "id": "52365419273",
        "owner": "12345678@N00",
        "secret": "a1b2c3d4e5",
        "server": "65535",
        "farm": 66,
        "ispublic": 1,
        "url_m": medium_url,
        "height_m": 375,
        "width_m": 500,
    });
    if let Some(title) = title {
        photo["title"] = json!(title);
    }
    photo
}

/// A plausible photo title.
pub fn fake_title() -> String {
    let words: Vec<String> = Words(2..5).fake();
    words.join(" ")
}

/// Serve [`IMAGE_BYTES`] at `path` on `server`.
pub async fn mock_image<'a>(server: &'a MockServer, path: &str) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.path(path);
            then.status(200)
                .header("Content-Type", "image/jpeg")
                .body(IMAGE_BYTES);
        })
        .await
}
