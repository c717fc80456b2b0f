use crate::error::ConfigError;

/// Deepest bound the configuration accepts.
pub const MAX_SEARCH_DEPTH: u8 = 16;

/// Linear depth schedule: shallow while the board is wide open, deeper as it
/// fills up.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DepthConfig {
    /// Depth on a full board, before clamping.
    pub base: f64,
    /// Depth change per empty cell. Must not be positive.
    pub slope: f64,
    pub min: u8,
    pub max: u8,
}

impl Default for DepthConfig {
    fn default() -> Self {
        DepthConfig {
            base: 8.0,
            slope: -0.05,
            min: 4,
            max: 9,
        }
    }
}

impl DepthConfig {
    /// Search depth for a position with `empty_cells` empty cells.
    pub fn depth_for(&self, empty_cells: usize) -> u8 {
        let raw = (self.base + self.slope * empty_cells as f64).trunc();
        // `as` saturates, NaN maps to zero.
        (raw as u8).max(self.min).min(self.max)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base.is_finite() || !self.slope.is_finite() {
            return Err(ConfigError::Validation(
                "depth.base and depth.slope must be finite".to_string(),
            ));
        }
        if self.slope > 0.0 {
            return Err(ConfigError::Validation(format!(
                "depth.slope must be <= 0, got {}",
                self.slope
            )));
        }
        if self.min == 0 || self.min > self.max || self.max > MAX_SEARCH_DEPTH {
            return Err(ConfigError::Validation(format!(
                "depth bounds must satisfy 1 <= min <= max <= {MAX_SEARCH_DEPTH}, got {}..={}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}
