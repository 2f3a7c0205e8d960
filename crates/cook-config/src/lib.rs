//! Configuration for the generify resolver (`cook.toml`) and tracing set-up.
//!
//! Example:
//! ```toml
//! [resolver]
//! max_depth = 256
//! max_solutions = 32
//! reduce_solutions = true
//!
//! [logging]
//! level = "debug"
//! json = false
//! ```

use std::path::Path;
use std::sync::Once;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

mod schema;

pub use schema::json_schema;

/// Tracing target used by the resolver crates.
pub const RESOLVER_TARGET: &str = "cook.resolve";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CookConfig {
    /// Search limits for the resolver tree.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Global logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Nodes deeper than this are abandoned. Each expansion consumes one constraint, so this
    /// only triggers on pathological systems. `0` only accepts a root without constraints.
    #[serde(default = "ResolverConfig::default_max_depth")]
    pub max_depth: usize,

    /// Stop the search once this many solutions have been collected.
    #[serde(default)]
    pub max_solutions: Option<usize>,

    /// Break self-referential bindings (`reduce_recursive`) before returning solutions.
    #[serde(default)]
    pub reduce_solutions: bool,
}

impl ResolverConfig {
    fn default_max_depth() -> usize {
        512
    }

    /// `true` once `found` solutions satisfy `max_solutions`.
    pub fn solutions_exhausted(&self, found: usize) -> bool {
        self.max_solutions.is_some_and(|max| found >= max)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            max_solutions: None,
            reduce_solutions: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write logs to stderr. When disabled, events are filtered but not printed.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Create the effective `EnvFilter`.
    ///
    /// If `RUST_LOG` is set, it is merged into the configured directives.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message only; the default `Display` embeds a source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl CookConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call installs the subscriber. Returns `true` if
/// this call installed it.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let mut installed = false;
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();

        let base_layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> =
            match (config.stderr, config.json) {
                (false, _) => tracing_subscriber::layer::Identity::new().boxed(),
                // `TestWriter` keeps `cargo test` output captured per test.
                (true, true) => tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                    .with_ansi(false)
                    .boxed(),
                (true, false) => tracing_subscriber::fmt::layer()
                    .with_writer(tracing_subscriber::fmt::writer::TestWriter::with_stderr)
                    .with_ansi(false)
                    .boxed(),
            };

        let subscriber = tracing_subscriber::registry().with(filter).with(base_layer);
        installed = tracing::subscriber::set_global_default(subscriber).is_ok();
        if installed {
            tracing::debug!(target: "cook.config", level = %config.level, "tracing initialized");
        }
    });
    installed
}
