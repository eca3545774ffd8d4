//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

use schannel_time::Seconds;

pub mod settings {
    use super::*;

    /// Name of the folder created inside the platform config directory
    pub const SETTINGS_APP_DIR_NAME: &str = "schannel";
    pub const SETTINGS_FILE_NAME: &str = "settings.toml";
    pub const SETTINGS_ENV_PREFIX: &str = "APP";
    pub const SETTINGS_DEFAULT_FETCH_TIMEOUT: Seconds = Seconds::new(30);
    pub const SETTINGS_DEFAULT_LOG_FILTER: &str = "info";
}

pub mod storage {
    pub const STORAGE_USER_CONFIG_FILE_NAME: &str = "config.toml";
    /// Suffix appended to the config file name while an atomic save is in
    /// progress
    pub const STORAGE_TEMP_SUFFIX: &str = "tmp";
    pub const STORAGE_CREDENTIALS_FILE_NAME: &str = "users.db";
}

pub mod session {
    use super::*;

    /// Sessions older than this are only logged as suspicious, the portal is
    /// still the one that decides if they are valid
    pub const SESSION_AGE_WARNING: Seconds = Seconds::new(12 * 60 * 60);
}
