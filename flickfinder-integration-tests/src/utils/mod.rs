//! Helpers shared by the integration tests.

pub mod flickr;
pub mod logging;
pub mod test_tools;
