#![warn(missing_docs, clippy::missing_docs_in_private_items)]
// The helpers are only used from `#[cfg(test)]` modules, but stay public so
// they show up in the docs.
#![allow(dead_code)]

//! Tests for FlickFinder that run whole searches against a mock Flickr.
//!
//! The query parameters sent to Flickr and the fields read back from it are
//! Flickr's public API, so tests here check them literally.
//!
//! Keeping these in their own crate builds one test binary for all of them,
//! rather than one per file under `flickfinder/tests/`.
//!
//! The primary tool used by tests is [`flickfinder_test`], which starts a mock
//! Flickr, builds a search session pointed at it, and collects logs. It then
//! calls the test function that is passed to it, providing the above tools as
//! an argument.

mod busy;
mod failures;
mod location;
mod logging;
mod phrase;
mod selection;
mod utils;

pub use crate::utils::{
    flickr::{fake_title, mock_image, photo, search_page, IMAGE_BYTES, REST_PATH},
    logging::{LogWatcher, TracingJsonEvent},
    test_tools::{flickfinder_test, TestingTools},
};
