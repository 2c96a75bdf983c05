// Only overview documentation that is not relevant to one of the more specific
// crates should go here.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Find a random photo on Flickr, by phrase or by location.
//!
//! FlickFinder is split into several subcrates that work in collaboration.
//!
//! - [flickfinder-settings](../flickfinder_settings/index.html)
//! - [flickfinder-search](../flickfinder_search/index.html)
//! - [flickfinder-flickr](../flickfinder_flickr/index.html)
//! - [flickfinder-session](../flickfinder_session/index.html)
//! - [flickfinder-integration-tests](../flickfinder_integration_tests/index.html)

use anyhow::{Context, Result};
use clap::Parser;
use flickfinder_flickr::FlickrClient;
use flickfinder_search::{QueryBuilder, TimeoutSource};
use flickfinder_session::{SearchInput, SearchSession};
use flickfinder_settings::{LogFormat, Settings};
use std::path::PathBuf;
use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "flickfinder")]
#[command(about = "Download a random Flickr photo matching a phrase or near a location", long_about = None)]
struct Args {
    /// Free text to search for
    #[arg(short, long, conflicts_with_all = ["lat", "lon"], required_unless_present_all = ["lat", "lon"])]
    phrase: Option<String>,

    /// Latitude of the place to search around, in [-90, 90]
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<String>,

    /// Longitude of the place to search around, in [-180, 180]
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<String>,

    /// Where to save the photo
    #[arg(short, long, default_value = "photo.jpg")]
    output: PathBuf,
}

impl Args {
    /// The search the user asked for.
    fn input(&self) -> SearchInput {
        match (&self.phrase, &self.lat, &self.lon) {
            (Some(phrase), _, _) => SearchInput::phrase(phrase.as_str()),
            (None, lat, lon) => SearchInput::location(
                lat.clone().unwrap_or_default(),
                lon.clone().unwrap_or_default(),
            ),
        }
    }
}

/// Primary entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load().context("Loading settings")?;
    init_logging(&settings)?;
    settings.validate().context("Checking settings")?;

    let flickr = FlickrClient::new_boxed(&settings.flickr).context("Setting up Flickr client")?;
    let source = TimeoutSource::new_boxed(&settings.search, flickr);
    let session = SearchSession::new(QueryBuilder::from_settings(&settings), source);

    let photo = match session.search(args.input()).await {
        Ok(photo) => photo,
        Err(error) => {
            let message = error.user_message();
            return Err(anyhow::Error::new(error).context(message));
        }
    };

    std::fs::write(&args.output, &photo.image)
        .with_context(|| format!("Writing photo to {}", args.output.display()))?;
    tracing::info!(output = %args.output.display(), url = %photo.image_url, "saved photo");
    println!("{}", session.status());

    Ok(())
}

/// Set up logging for FlickFinder, based on settings and the `RUST_LOG`
/// environment variable. Logs go to stderr, so stdout only has the title.
fn init_logging(settings: &Settings) -> Result<()> {
    LogTracer::init()?;
    let env_filter: EnvFilter = (&settings.logging.levels).into();
    let builder = tracing_subscriber::fmt::Subscriber::builder().with_writer(std::io::stderr);

    match settings.logging.format {
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(builder.pretty().finish().with(env_filter))?;
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().finish().with(env_filter))?;
        }
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.compact().finish().with(env_filter))?;
        }
    }

    Ok(())
}
