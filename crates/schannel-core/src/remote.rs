//! The boundary to the web portal.
//!
//! How the portal pages are requested and scraped is up to the implementor,
//! the core only relies on the typed results below.

use std::future::Future;

use schannel_shared::{
    account::{Invoice, Service, SsrInfo},
    session::Session,
    uac::{AuthError, Username},
    user_config::ProxyConfig,
};
use secrecy::SecretString;

/// Failure reported by the portal client for a data fetch
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The portal rejected the session (401/403 or a redirect to the login
    /// page)
    #[error("session rejected by the portal")]
    Unauthorized,
    #[error("network error: {0}")]
    Network(String),
    #[error("portal unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected response from the portal: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns `true` if the remote error is [`Unauthorized`].
    ///
    /// [`Unauthorized`]: RemoteError::Unauthorized
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Performs the authenticated calls against the portal.
///
/// Every call is independent, the core may run several of them at the same
/// time on one client.
pub trait RemoteAccountClient: Send + Sync + 'static {
    fn authenticate(
        &self,
        username: &Username,
        password: &SecretString,
        proxy: Option<&ProxyConfig>,
    ) -> impl Future<Output = Result<Session, AuthError>> + Send;

    fn fetch_service(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Service, RemoteError>> + Send;

    fn fetch_invoices(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<Invoice>, RemoteError>> + Send;

    fn fetch_ssr_info(
        &self,
        session: &Session,
        service: &Service,
    ) -> impl Future<Output = Result<SsrInfo, RemoteError>> + Send;
}
