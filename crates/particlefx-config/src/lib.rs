//! Configuration file handling for particlefx.
//!
//! Settings live in a single TOML file with an `[engine]` table holding the
//! [`EngineConfig`] and a `[player]` table for the terminal front end. Every
//! key is optional; missing keys take their defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{debug, info};
use particlefx_core::{EngineConfig, InvalidConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the log file inside the data directory.
pub const LOG_FILE_NAME: &str = "particlefx.log";

/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 240;

/// Errors that can occur while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No home directory to derive the config location from.
    #[error("could not determine the user's config directory")]
    NoHomeDirectory,

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] InvalidConfig),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for the terminal player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Target frames per second.
    pub fps: u32,
    /// Surface pixels per terminal column.
    ///
    /// Each cell shows two vertically stacked pixels, so a cell covers
    /// `scale` by `2 * scale` surface pixels.
    pub scale: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { fps: 60, scale: 2 }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> std::result::Result<(), InvalidConfig> {
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(InvalidConfig {
                field: "fps",
                reason: format!("{} is outside 1..={MAX_FPS}", self.fps),
            });
        }
        if self.scale == 0 {
            return Err(InvalidConfig {
                field: "scale",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub player: PlayerConfig,
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    ///
    /// A relative `engine.image_src` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let (Some(src), Some(dir)) = (config.engine.image_src.as_mut(), path.parent()) {
            if src.is_relative() {
                *src = dir.join(&*src);
            }
        }

        config.validate()?;
        config.engine = config.engine.normalized()?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), InvalidConfig> {
        self.engine.validate()?;
        self.player.validate()
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "particlefx").ok_or(ConfigError::NoHomeDirectory)
}

/// Default location of the configuration file.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

/// Default location of the log file.
pub fn default_log_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(LOG_FILE_NAME))
}
