use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GRID_SIZE: u16 = 20;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_CELL_WIDTH: u16 = 2;

const MAX_GRID_SIZE: u16 = 255;
const MAX_TICK_INTERVAL_MS: u64 = 10_000;
const MAX_CELL_WIDTH: u16 = 4;

/// Game settings. Keys in a config file are camelCase (`gridWidth`,
/// `gridHeight`, `tickIntervalMs`, `cellWidth`, `seed`); unknown keys are an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GameConfig {
    pub grid_width: u16,
    pub grid_height: u16,
    pub tick_interval_ms: u64,
    /// Terminal columns used to draw one grid cell
    pub cell_width: u16,
    /// Fixed RNG seed for reproducible food placement
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            grid_width: DEFAULT_GRID_SIZE,
            grid_height: DEFAULT_GRID_SIZE,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            cell_width: DEFAULT_CELL_WIDTH,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn new(grid_width: u16, grid_height: u16) -> Self {
        GameConfig { grid_width, grid_height, ..Default::default() }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_grid_side("gridWidth", self.grid_width)?;
        check_grid_side("gridHeight", self.grid_height)?;

        if self.tick_interval_ms == 0 || self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                field: "tickIntervalMs",
                reason: format!("must be between 1 and {}, got {}", MAX_TICK_INTERVAL_MS, self.tick_interval_ms),
            });
        }

        if self.cell_width == 0 || self.cell_width > MAX_CELL_WIDTH {
            return Err(ConfigError::Invalid {
                field: "cellWidth",
                reason: format!("must be between 1 and {}, got {}", MAX_CELL_WIDTH, self.cell_width),
            });
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn check_grid_side(field: &'static str, value: u16) -> Result<(), ConfigError> {
    if value < 2 || value > MAX_GRID_SIZE {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("must be between 2 and {}, got {}", MAX_GRID_SIZE, value),
        });
    }
    Ok(())
}
