//! Session handling, persistence and account synchronization for the
//! schannel desktop client
//! NB: The assumption is made that the async runtime has already been started
//! before any async functions from this library are called

#![warn(unused_crate_dependencies)]

pub mod config_store;
pub mod credential_store;
pub mod remote;
pub mod session_manager;
pub mod settings;
pub mod sync;

pub use config_store::{ConfigError, ConfigStore, FileConfigStore};
pub use credential_store::{CredentialStore, CredentialStoreError, KnownUser};
pub use remote::{RemoteAccountClient, RemoteError};
pub use session_manager::SessionManager;
pub use settings::{get_settings, Settings, SettingsError};
pub use sync::{
    AggregateView, FetchCause, FetchError, FetchTarget, InvalidSelectionError, NodeSwitchError,
    ObserverId, PartialRefresh, RefreshError, RefreshFailure, Snapshot, SyncController, SyncEvent,
    SyncObserver,
};
