use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("terminal is {actual_width}x{actual_height}, the board needs at least {needed_width}x{needed_height}")]
    TooSmall {
        needed_width: u16,
        needed_height: u16,
        actual_width: u16,
        actual_height: u16,
    },
}
