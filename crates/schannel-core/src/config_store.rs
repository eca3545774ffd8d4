use std::{
    fs::{self, File},
    io::Write as _,
    path::{Path, PathBuf},
};

use schannel_shared::{
    const_config::storage::STORAGE_TEMP_SUFFIX, log_err_as_warn, user_config::UserConfig,
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Expected on first start, callers fall back to [`UserConfig::default`]
    #[error("config file not found: {path:?}")]
    NotFound { path: PathBuf },
    /// An existing file that does not parse is never silently replaced
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Returns `true` if the config error is [`NotFound`].
    ///
    /// [`NotFound`]: ConfigError::NotFound
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the config error is [`Parse`].
    ///
    /// [`Parse`]: ConfigError::Parse
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Durable storage for the [`UserConfig`]
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Result<UserConfig, ConfigError>;

    /// Must be atomic from the caller's point of view: a crash part way
    /// through leaves either the old or the new file, never a broken one
    fn save(&self, config: &UserConfig) -> Result<(), ConfigError>;

    /// Loads the config treating a missing file as the default config
    fn load_or_default(&self) -> Result<UserConfig, ConfigError> {
        match self.load() {
            Err(ConfigError::NotFound { path }) => {
                info!(?path, "no config file found, using defaults");
                Ok(UserConfig::default())
            }
            other => other,
        }
    }
}

/// Stores the config as a TOML file
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".");
        file_name.push(STORAGE_TEMP_SUFFIX);
        self.path.with_file_name(file_name)
    }

    fn io_err(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for FileConfigStore {
    #[tracing::instrument(err(Debug))]
    fn load(&self) -> Result<UserConfig, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(err) => return Err(self.io_err(err)),
        };
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        debug!(?config, "config loaded");
        Ok(config)
    }

    #[tracing::instrument(err(Debug))]
    fn save(&self, config: &UserConfig) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_err(err))?;
        }

        // Write next to the target so the rename stays on the same file system
        let temp_path = self.temp_path();
        let write_temp = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()
        };
        if let Err(err) = write_temp() {
            log_err_as_warn!(fs::remove_file(&temp_path));
            return Err(self.io_err(err));
        }
        fs::rename(&temp_path, &self.path).map_err(|err| self.io_err(err))?;
        debug!(path = ?self.path, "config saved");
        Ok(())
    }
}
