use std::path::Path;
use std::time::Duration;

use log::warn;

use crate::depth::{DepthConfig, MAX_SEARCH_DEPTH};
use crate::error::ConfigError;
use crate::eval::EvalWeights;

/// Engine configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: EvalWeights,
    pub depth: DepthConfig,
    /// Search exactly this deep instead of following the depth schedule.
    pub fixed_depth: Option<u8>,
    /// Stop deepening once this many milliseconds have passed.
    pub time_limit_ms: Option<u64>,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.depth.validate()?;
        if let Some(depth) = self.fixed_depth {
            if depth == 0 || depth > MAX_SEARCH_DEPTH {
                return Err(ConfigError::Validation(format!(
                    "fixed_depth must be in 1..={MAX_SEARCH_DEPTH}, got {depth}"
                )));
            }
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::Validation(
                "time_limit_ms must be > 0".to_string(),
            ));
        }
        if self.weights.win <= 0 {
            return Err(ConfigError::Validation(
                "weights.win must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_fixed_depth(mut self, depth: u8) -> Self {
        self.fixed_depth = Some(depth);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Depth bound for a position with `empty_cells` empty cells.
    pub fn depth_for(&self, empty_cells: usize) -> u8 {
        self.fixed_depth
            .unwrap_or_else(|| self.depth.depth_for(empty_cells))
    }
}
