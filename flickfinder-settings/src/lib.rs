#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! # FlickFinder Settings
//!
//! Configuration is specified in several ways, with later methods overriding earlier ones.
//!
//! 1. A base configuration checked into the repository, in `config/base.yaml`.
//!    This provides the default values for most settings.
//! 2. Per-environment configuration files in the `config` directory. The
//!    environment is selected using the environment variable `FLICKFINDER_ENV`.
//!    The settings for that environment are then loaded from
//!    `config/${env}.yaml`, if it exists. The default environment is
//!    "development".
//! 3. A local configuration file not checked into the repository, at
//!    `config/local.yaml`. This is the place to put a real Flickr API key.
//! 4. Environment variables that begin with `FLICKFINDER_` and use `__` as a
//!    separator between levels. For example, `Settings::flickr::api_key` can be
//!    controlled from the environment variable `FLICKFINDER_FLICKR__API_KEY`.
//!
//! Tests should use `Settings::load_for_tests` which only reads from
//! `config/base.yaml`, `config/test.yaml`, and `config/local_test.yaml` (if it
//! exists). It does not read from environment variables. `RUST_LOG` is only
//! consulted when a log filter is built from [`LoggingSettings::levels`].
//!
//! Configuration files are canonically YAML files. However, any format supported
//! by the [config] crate can be used, including JSON and TOML.

mod logging;

pub use logging::{DirectiveWrapper, LogFormat, LoggingSettings};

use anyhow::{bail, ensure};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

/// Top level settings object for FlickFinder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// The environment FlickFinder is running in. Should only be set with the
    /// `FLICKFINDER_ENV` environment variable.
    pub env: String,

    /// Enable additional debugging output. This should not be set to true in
    /// production environments.
    pub debug: bool,

    /// Where and how to reach the Flickr REST API.
    pub flickr: FlickrSettings,

    /// Tuning for the queries sent to Flickr.
    pub search: SearchSettings,

    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Settings for the Flickr REST API.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlickrSettings {
    /// URL scheme of the API, normally `https`.
    pub scheme: String,

    /// Host of the API, such as `api.flickr.com`. May include a port, which is
    /// mostly useful when pointing at a local mock server.
    pub host: String,

    /// Path of the REST endpoint, such as `/services/rest`.
    pub path: String,

    /// The static API key sent with every search.
    pub api_key: String,

    /// User-Agent sent with both the search and the image requests.
    pub user_agent: String,

    /// Upper bound for a single HTTP request, from connecting until the body
    /// has been read.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "request_timeout_ms")]
    pub request_timeout: Duration,

    /// Upper bound for establishing a connection.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "connect_timeout_ms")]
    pub connect_timeout: Duration,
}

/// Settings that shape the search queries.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Half the width, in degrees of longitude, of the box searched around a
    /// location.
    pub bbox_half_width: f64,

    /// Half the height, in degrees of latitude, of the box searched around a
    /// location.
    pub bbox_half_height: f64,

    /// The longest a whole search may take, including the image download.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "max_time_ms")]
    pub max_time: Duration,
}

impl Settings {
    /// Load settings from configuration files and environment variables.
    ///
    /// # Errors
    /// If any of the configured values are invalid, or if any of the required
    /// configuration files are missing.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("FLICKFINDER_ENV").unwrap_or_else(|_| "development".to_string());

        Config::builder()
            // Start off with the base config.
            .add_source(File::with_name("./config/base"))
            // Merge in an environment specific config.
            .set_override("env", env.as_str())?
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables that start with "FLICKFINDER_" and have
            // "__" to separate levels. For example, `FLICKFINDER_FLICKR__API_KEY`
            // maps to `Settings::flickr::api_key`.
            .add_source(
                Environment::with_prefix("FLICKFINDER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Load settings from configuration files for tests.
    ///
    /// `changer` is called with the loaded settings before they are returned,
    /// so that tests can adjust individual values.
    ///
    /// # Panics
    /// If the test configuration files are missing or invalid.
    pub fn load_for_tests<F: FnOnce(&mut Self)>(changer: F) -> Self {
        let mut settings: Self = Config::builder()
            // Start off with the base config.
            .add_source(File::with_name("../config/base"))
            // Merge in test specific config.
            .add_source(File::with_name("../config/test"))
            // Add a local configuration file that is `.gitignore`ed.
            .add_source(File::with_name("../config/local_test").required(false))
            .set_override("env", "test")
            .expect("Could not set env for tests")
            .build()
            .expect("Could not load settings for tests")
            .try_deserialize()
            .expect("Could not convert settings");

        changer(&mut settings);
        settings
    }

    /// Check the values that the type system cannot.
    ///
    /// # Errors
    /// If the API key is missing, or the bounding box half sizes are not
    /// positive finite numbers.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.flickr.api_key.trim().is_empty() {
            bail!("A Flickr API key is required, set flickr.api_key");
        }

        for (name, value) in [
            ("search.bbox_half_width", self.search.bbox_half_width),
            ("search.bbox_half_height", self.search.bbox_half_height),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{} must be a positive number, got {}",
                name,
                value
            );
        }

        Ok(())
    }
}
