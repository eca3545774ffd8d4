use schannel_shared::{uac::AuthError, user_config::UserConfig};

use super::AggregateView;

/// Notification sent to front ends after the core state changed
#[derive(Debug, Clone)]
pub enum SyncEvent {
    ViewChanged(AggregateView),
    ConfigChanged(UserConfig),
    AuthFailed(AuthError),
}

/// Receives [`SyncEvent`]s.
///
/// Called synchronously on the task that triggered the change, in the order
/// observers were registered. A front end with its own event loop must hand
/// the event over to that loop itself.
pub trait SyncObserver: 'static + Send + Sync + Fn(&SyncEvent) {}
impl<T> SyncObserver for T where T: 'static + Send + Sync + Fn(&SyncEvent) {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl From<u64> for ObserverId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
