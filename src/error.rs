//! Error handling types for mosaic-ls.
//!
//! Most failures inside the bridge are soft: an untracked document, an
//! unmappable range or a failing engine call simply contribute nothing to the
//! result. The types here cover the conditions that do cross an API boundary.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::PoisonError;
use thiserror::Error;

/// Error reported by a language engine adapter.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl EngineError {
    /// Create an engine error without an underlying source.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an engine error wrapping an underlying source.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable description without the optional source.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type returned by engine queries.
pub type EngineResult<T> = Result<T, EngineError>;

/// The host abandoned the request before it completed.
///
/// This is the only error a feature query surfaces; everything else degrades
/// to an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request cancelled")]
pub struct RequestCancelled;

/// Result type returned by feature queries.
pub type FeatureResult<T> = Result<T, RequestCancelled>;

/// Errors raised while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the settings schema.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        ConfigError::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Helper trait to recover the guard from a poisoned lock.
pub trait LockResultExt<T> {
    /// Return the guard, recovering it (with a warning) if the lock was poisoned.
    ///
    /// The context parameter identifies which operation triggered lock recovery,
    /// helping developers debug thread safety issues.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "mosaic::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}
