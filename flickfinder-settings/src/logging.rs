use anyhow::{bail, Context};
use serde::{de, Deserialize, Serialize};
use std::{ops::AddAssign, str::FromStr};
use tracing_subscriber::{filter::Directive, EnvFilter};

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// The minimum level that logs should be reported at.
    ///
    /// Each entry can be one of `ERROR`, `WARN`, `INFO`, `DEBUG`, or `TRACE` (in
    /// increasing verbosity), with an optional component that specifies the
    /// source of the logs.
    ///
    /// The contents of the environment variable `RUST_LOG` are added after the
    /// configured levels, so they take precedence.
    ///
    /// # Examples
    ///
    /// The configurations below are identical
    ///
    /// ```yaml
    /// # config/local.yaml
    /// logging:
    ///   levels:
    ///     - INFO                      # default to INFO
    ///     - flickfinder_flickr=DEBUG  # print every URL requested
    ///     - hyper=WARN
    /// ```
    ///
    /// ```shell
    /// RUST_LOG=INFO,flickfinder_flickr=DEBUG,hyper=WARN
    /// ```
    pub levels: DirectiveWrapper,

    /// The format to output logs in.
    pub format: LogFormat,
}

/// Output formats for log events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// [`tracing-subscriber`]'s human targeted, pretty format. Multiple lines
    /// per log event.
    Pretty,

    /// Newline delimited JSON. One line per log event.
    Json,

    /// [`tracing-subscriber`]'s default format. One line per log event.
    Compact,
}

/// Log filter directives, kept as strings so that settings stay `Clone` and
/// serializable.
///
/// Deserializes from a comma separated string (`"INFO,hyper=WARN"`), which is
/// what environment variables provide, or from a list of such strings, which is
/// what the config files use. Every entry is known to parse as a
/// [`Directive`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DirectiveWrapper(Vec<String>);

impl DirectiveWrapper {
    /// The directives, in the order they will be applied.
    pub fn directives(&self) -> &[String] {
        &self.0
    }
}

/// The shapes `levels` may take in a config source.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDirectives {
    /// `"INFO,hyper=WARN"`
    Joined(String),
    /// `["INFO", "hyper=WARN"]`
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for DirectiveWrapper {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = match RawDirectives::deserialize(deserializer)? {
            RawDirectives::Joined(joined) => vec![joined],
            RawDirectives::List(list) => list,
        };

        let mut rv = Self(Vec::new());
        for entry in entries {
            rv += entry.parse::<Self>().map_err(|err: anyhow::Error| {
                de::Error::invalid_value(de::Unexpected::Str(&entry), &err.to_string().as_str())
            })?;
        }

        Ok(rv)
    }
}

impl FromStr for DirectiveWrapper {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect();

        // Test that each part can be parsed as a logging filter directive.
        if let Some(err) = parts.iter().find_map(|p| p.parse::<Directive>().err()) {
            return Err(err).context("valid syntax");
        }

        // Crate names show up in targets with underscores, never hyphens.
        if parts.iter().any(|p| p.contains('-')) {
            bail!("log targets must not include hyphens");
        }

        Ok(Self(parts))
    }
}

impl AddAssign for DirectiveWrapper {
    fn add_assign(&mut self, rhs: Self) {
        self.0.extend(rhs.0)
    }
}

/// Builds a filter from the configured directives, followed by those in
/// `RUST_LOG` so that they win. Entries of `RUST_LOG` that do not parse are
/// skipped.
impl From<&DirectiveWrapper> for EnvFilter {
    fn from(val: &DirectiveWrapper) -> Self {
        let rust_log = std::env::var("RUST_LOG").unwrap_or_default();
        val.0
            .iter()
            .map(String::as_str)
            .chain(rust_log.split(',').map(str::trim))
            .filter(|directive| !directive.is_empty())
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::default(), EnvFilter::add_directive)
    }
}
