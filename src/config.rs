use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

const DEFAULT_LISTEN: &str = "127.0.0.1:4221";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the listener binds; port 0 picks an ephemeral port.
    pub listen: String,
    /// Root of the `/files/` route.
    pub directory: PathBuf,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unable to find configuration file at {0}")]
    FileNotFound(PathBuf),
    #[error("Unable to read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),
    #[error("Configuration file is not valid toml: {0}")]
    FileFormatSyntaxError(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Resolves configuration: defaults, then the optional TOML file, then
/// the `--directory` flag on top.
///
/// ```toml
/// [echofs]
/// listen = "127.0.0.1:4221"
/// directory = "/srv/echofs-data"
/// ```
pub fn load(path: Option<&Path>, directory_flag: Option<&str>) -> Result<AppConfig, Error> {
    let mut result = AppConfig {
        listen: DEFAULT_LISTEN.to_string(),
        directory: env::current_dir()?,
    };

    if let Some(config_path) = path {
        if !config_path.is_file() {
            return Err(Error::FileNotFound(config_path.to_path_buf()));
        }
        let config = std::fs::read(config_path)?;
        let toml = toml::from_slice::<toml::Value>(&config)?;
        let section = toml.get("echofs").ok_or_else(|| {
            Error::InvalidConfiguration("missing configuration key: echofs".into())
        })?;

        if let Some(listen) = section.get("listen") {
            result.listen = listen
                .as_str()
                .ok_or_else(|| {
                    Error::InvalidConfiguration("echofs.listen must be a string".into())
                })?
                .to_string();
        }
        if let Some(directory) = section.get("directory") {
            result.directory = PathBuf::from(directory.as_str().ok_or_else(|| {
                Error::InvalidConfiguration("echofs.directory must be a string".into())
            })?);
        }
    }

    if let Some(directory) = directory_flag {
        result.directory = PathBuf::from(directory);
    }

    Ok(result)
}
