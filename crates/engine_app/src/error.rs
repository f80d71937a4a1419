//! Entity manager error types.

use std::path::PathBuf;

use engine_component::Entity;
use engine_event::EventError;

/// Errors surfaced by the world and the tick loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The entity was never spawned or has been despawned.
    #[error("unknown entity {0}")]
    UnknownEntity(Entity),

    /// The end-of-frame event dispatch failed.
    #[error("event dispatch failed: {0}")]
    Event(#[from] EventError),

    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The config file is not valid JSON for [`EngineConfig`](crate::config::EngineConfig).
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
