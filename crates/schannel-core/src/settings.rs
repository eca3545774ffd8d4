use std::path::{Path, PathBuf};

use schannel_shared::const_config::{
    settings::{
        SETTINGS_APP_DIR_NAME, SETTINGS_DEFAULT_FETCH_TIMEOUT, SETTINGS_DEFAULT_LOG_FILTER,
        SETTINGS_ENV_PREFIX, SETTINGS_FILE_NAME,
    },
    storage::{STORAGE_CREDENTIALS_FILE_NAME, STORAGE_USER_CONFIG_FILE_NAME},
};
use schannel_time::Seconds;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Process level settings, as opposed to the per user [`UserConfig`]
///
/// [`UserConfig`]: schannel_shared::user_config::UserConfig
#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    /// Directory holding the user config, the credentials database and traces
    pub data_dir: PathBuf,
    /// Upper bound for each individual fetch during a refresh
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub fetch_timeout_secs: u64,
    pub log_filter: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("unable to determine the platform config directory")]
    NoConfigDir,
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl Settings {
    pub fn fetch_timeout(&self) -> Seconds {
        Seconds::new(self.fetch_timeout_secs)
    }

    pub fn user_config_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_USER_CONFIG_FILE_NAME)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_CREDENTIALS_FILE_NAME)
    }
}

pub fn default_data_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SETTINGS_APP_DIR_NAME))
}

/// Builds the settings from (lowest priority first) the defaults, an optional
/// `settings.toml` in the data directory and environment variables.
///
/// Environment variables use a prefix of `APP` and `__` as separator. E.g.
/// `APP_FETCH_TIMEOUT_SECS=10` sets `Settings.fetch_timeout_secs`.
/// `data_dir_override` wins over everything else.
pub fn get_settings(data_dir_override: Option<PathBuf>) -> Result<Settings, SettingsError> {
    let base_dir = match data_dir_override.clone() {
        Some(dir) => dir,
        None => default_data_dir().ok_or(SettingsError::NoConfigDir)?,
    };
    let mut builder = config::Config::builder()
        .set_default("data_dir", path_value(&base_dir))?
        .set_default("fetch_timeout_secs", SETTINGS_DEFAULT_FETCH_TIMEOUT.as_u64())?
        .set_default("log_filter", SETTINGS_DEFAULT_LOG_FILTER)?
        .add_source(config::File::from(base_dir.join(SETTINGS_FILE_NAME)).required(false))
        .add_source(
            config::Environment::with_prefix(SETTINGS_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );
    if let Some(dir) = data_dir_override {
        builder = builder.set_override("data_dir", path_value(&dir))?;
    }

    Ok(builder.build()?.try_deserialize::<Settings>()?)
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
