use schannel_shared::{account::NodeId, errors::NotLoggedInError};

use crate::{config_store::ConfigError, remote::RemoteError, sync::AggregateView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FetchTarget {
    Service,
    Invoices,
    SsrInfo,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchCause {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("cancelled")]
    Cancelled,
    #[error("timed out")]
    TimedOut,
    /// The node list cannot be requested without knowing the service
    #[error("no service available to fetch nodes for")]
    ServiceUnavailable,
}

/// One remote call of a refresh that did not produce a value
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch {target}: {cause}")]
pub struct FetchError {
    pub target: FetchTarget,
    pub cause: FetchCause,
}

#[derive(thiserror::Error, Debug)]
pub enum RefreshFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to persist reconciled node selection: {0}")]
    Persist(#[from] ConfigError),
}

/// A refresh that only partly succeeded.
///
/// The view is still usable, each field says whether it is fresh, stale or
/// missing
#[derive(thiserror::Error, Debug)]
#[error("refresh incomplete ({} failure(s)): {}", .failures.len(), summarize(.failures))]
pub struct PartialRefresh {
    pub view: Box<AggregateView>,
    pub failures: Vec<RefreshFailure>,
}

#[derive(thiserror::Error, Debug)]
pub enum RefreshError {
    #[error(transparent)]
    NotLoggedIn(#[from] NotLoggedInError),
    #[error(transparent)]
    Partial(#[from] PartialRefresh),
}

/// The requested node is not in the latest node list
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("node '{node_id}' is not available")]
pub struct InvalidSelectionError {
    pub node_id: NodeId,
}

#[derive(thiserror::Error, Debug)]
pub enum NodeSwitchError {
    #[error(transparent)]
    InvalidSelection(#[from] InvalidSelectionError),
    #[error("failed to save node selection: {0}")]
    Config(#[from] ConfigError),
}

impl FetchError {
    pub fn new(target: FetchTarget, cause: FetchCause) -> Self {
        Self { target, cause }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(&self.cause, FetchCause::Remote(remote) if remote.is_unauthorized())
    }
}

impl PartialRefresh {
    pub fn fetch_errors(&self) -> impl Iterator<Item = &FetchError> {
        self.failures.iter().filter_map(|failure| match failure {
            RefreshFailure::Fetch(err) => Some(err),
            RefreshFailure::Persist(_) => None,
        })
    }

    pub fn failed_targets(&self) -> Vec<FetchTarget> {
        self.fetch_errors().map(|err| err.target).collect()
    }
}

impl RefreshError {
    /// The view to render, if the refresh got far enough to produce one
    pub fn partial_view(&self) -> Option<&AggregateView> {
        match self {
            RefreshError::NotLoggedIn(_) => None,
            RefreshError::Partial(partial) => Some(&partial.view),
        }
    }
}

fn summarize(failures: &[RefreshFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
