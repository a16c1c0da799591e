//! Example configuration.
//!
//! Callers hand in [`ExampleOptions`], a loose set of overrides that may come
//! from code or from a TOML snippet. They are resolved once against the
//! defaults into an immutable [`ExampleConfig`], which is what runners read.
//!
//! Only `spec_timeout` is interpreted here. Every other option is kept as-is
//! so event loop adapters can pick up their own settings (hosts, ports and
//! the like) from the same table.

use std::{collections::BTreeMap, time::Duration};

use serde::Deserialize;
use tracing::trace;

use crate::error::ConfigError;

/// The timeout applied when no `spec_timeout` option is given.
pub const DEFAULT_SPEC_TIMEOUT: Duration = Duration::from_secs(5);

/// Caller supplied overrides for an example.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExampleOptions {
    /// Timeout in seconds.
    pub spec_timeout: Option<f64>,

    /// Options not interpreted by this crate.
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl ExampleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn with_spec_timeout(self, seconds: f64) -> Self {
        Self {
            spec_timeout: Some(seconds),
            ..self
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Merge these overrides over the defaults.
    pub fn resolve(self) -> Result<ExampleConfig, ConfigError> {
        ExampleConfig::from_options(self)
    }
}

/// Resolved, immutable configuration of a single example.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleConfig {
    spec_timeout: Duration,
    extra: BTreeMap<String, toml::Value>,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            spec_timeout: DEFAULT_SPEC_TIMEOUT,
            extra: BTreeMap::new(),
        }
    }
}

impl ExampleConfig {
    pub fn from_options(options: ExampleOptions) -> Result<Self, ConfigError> {
        let ExampleOptions {
            spec_timeout,
            extra,
        } = options;

        let spec_timeout = match spec_timeout {
            None => DEFAULT_SPEC_TIMEOUT,
            Some(value) => Duration::try_from_secs_f64(value)
                .ok()
                .filter(|timeout| !timeout.is_zero())
                .ok_or(ConfigError::InvalidTimeout { value })?,
        };

        trace!(?spec_timeout, options = extra.len(), "resolved example config");
        Ok(Self {
            spec_timeout,
            extra,
        })
    }

    pub fn spec_timeout(&self) -> Duration {
        self.spec_timeout
    }

    /// Look up an option that is not interpreted by this crate.
    pub fn option(&self, name: &str) -> Option<&toml::Value> {
        self.extra.get(name)
    }

    pub fn options(&self) -> impl ExactSizeIterator<Item = (&str, &toml::Value)> {
        self.extra.iter().map(|(name, value)| (name.as_str(), value))
    }
}
