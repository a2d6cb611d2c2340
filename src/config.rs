use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Upper bound on the configurable push-chain length. A chain can never be
/// longer than the widest grid anyway.
pub const MAX_CHAIN_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Push chain length must be between 1 and {max}, got {0}", max = MAX_CHAIN_LEN)]
    InvalidChainLength(usize),
}

/// Tunable game rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Maximum number of boxes a single step may push. With the default of 1
    /// a box with another box behind it cannot be moved.
    pub max_chain_len: usize,
}

impl PuzzleConfig {
    pub const DEFAULT_MAX_CHAIN_LEN: usize = 1;

    pub fn new() -> Self {
        Self {
            max_chain_len: Self::DEFAULT_MAX_CHAIN_LEN,
        }
    }

    pub fn with_max_chain_len(max_chain_len: usize) -> Result<Self, ConfigError> {
        let config = Self { max_chain_len };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if (1..=MAX_CHAIN_LEN).contains(&self.max_chain_len) {
            Ok(())
        } else {
            Err(ConfigError::InvalidChainLength(self.max_chain_len))
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: PuzzleConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self::new()
    }
}
