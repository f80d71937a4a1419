//! Engine configuration: JSON file defaults overridden by command-line flags.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

use crate::error::EngineError;

/// Command-line interface of the engine binary.
#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Run the ECS frame loop with the demo systems")]
pub struct Cli {
    /// JSON config file. Missing fields fall back to defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target frames per second.
    #[arg(long)]
    pub tick_rate: Option<f64>,

    /// Number of frames to run (0 = unlimited).
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Number of demo entities to spawn.
    #[arg(long)]
    pub demo_entities: Option<usize>,

    /// Print the registered systems as JSON and exit.
    #[arg(long)]
    pub list_systems: bool,
}

/// Resolved engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Target frames per second.
    pub tick_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_ticks: u64,
    /// Number of demo entities spawned at startup.
    pub demo_entities: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 600,
            demo_entities: 8,
        }
    }
}

impl EngineConfig {
    /// Read a config file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ConfigIo`] or [`EngineError::ConfigParse`].
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input or unknown fields.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Check value ranges the frame loop depends on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] unless `tick_rate` is a finite,
    /// positive number.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.tick_rate.is_finite() && self.tick_rate > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "tick_rate must be a positive number, got {}",
                self.tick_rate
            )));
        }
        Ok(())
    }

    /// Resolve the final config: file (or defaults), then CLI overrides.
    ///
    /// # Errors
    ///
    /// Fails if `--config` names an unreadable or invalid file, or if the
    /// result does not pass [`EngineConfig::validate`].
    pub fn load(cli: &Cli) -> Result<Self, EngineError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(tick_rate) = cli.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(max_ticks) = cli.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(demo_entities) = cli.demo_entities {
            config.demo_entities = demo_entities;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_ticks": 5 }"#).unwrap();
        assert_eq!(config.max_ticks, 5);
        assert_eq!(config.tick_rate, 60.0);
        assert_eq!(config.demo_entities, 8);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(EngineConfig::from_json(r#"{ "tickrate": 30 }"#).is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = Cli::parse_from(["engine_app", "--max-ticks", "3", "--tick-rate", "120"]);
        let config = EngineConfig::load(&cli).unwrap();
        assert_eq!(config.max_ticks, 3);
        assert_eq!(config.tick_rate, 120.0);
        assert!(!cli.list_systems);
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let config =
            EngineConfig::from_json(r#"{"tick_rate":0,"max_ticks":1,"demo_entities":0}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));

        for rate in ["0", "-5", "inf", "NaN"] {
            let flag = format!("--tick-rate={rate}");
            let cli = Cli::parse_from(["engine_app", flag.as_str()]);
            assert!(
                matches!(EngineConfig::load(&cli), Err(EngineError::InvalidConfig(_))),
                "tick rate {rate} accepted"
            );
        }
    }

    #[test]
    fn test_missing_file_reports_path() {
        let cli = Cli::parse_from(["engine_app", "--config", "/nonexistent/engine.json"]);
        let err = EngineConfig::load(&cli).unwrap_err();
        assert!(matches!(err, EngineError::ConfigIo { .. }));
        assert!(err.to_string().contains("/nonexistent/engine.json"));
    }
}
