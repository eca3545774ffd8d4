use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use schannel_shared::{
    req_args::LoginReqArgs,
    session::Session,
    uac::{AuthError, BusyError, LoginError, Username},
    user_config::ProxyConfig,
};
use tracing::{info, warn};

use crate::remote::RemoteAccountClient;

/// Owns the authentication lifecycle.
///
/// At most one login may be in flight at a time, a second attempt is refused
/// with [`BusyError`] instead of being queued. A failed login never evicts the
/// session that is already held.
#[derive(Debug)]
pub struct SessionManager<R> {
    remote: Arc<R>,
    current: Mutex<Option<Arc<Session>>>,
    login_in_flight: AtomicBool,
}

/// Marks a login as in flight for as long as it is alive (also when the login
/// future is dropped part way through)
struct LoginInFlight<'a>(&'a AtomicBool);

impl<'a> LoginInFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, BusyError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| BusyError)
    }
}

impl Drop for LoginInFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R: RemoteAccountClient> SessionManager<R> {
    #[tracing::instrument(name = "NEW SESSION-MANAGER", skip(remote))]
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            current: Mutex::new(None),
            login_in_flight: AtomicBool::new(false),
        }
    }

    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn login(
        &self,
        args: &LoginReqArgs,
        proxy: Option<&ProxyConfig>,
    ) -> Result<Arc<Session>, LoginError> {
        let username = args.validate()?;
        let _in_flight = LoginInFlight::acquire(&self.login_in_flight)?;

        let session = self
            .remote
            .authenticate(&username, &args.password, proxy)
            .await
            .inspect_err(|err| warn!(%username, ?err, "portal refused login"))?;
        if session.is_empty() {
            return Err(AuthError::RemoteUnavailable(
                "portal returned no session cookies".to_string(),
            )
            .into());
        }

        let session = Arc::new(session);
        *self.current.lock().expect("mutex poisoned") = Some(Arc::clone(&session));
        info!(%username, "logged in");
        Ok(session)
    }

    /// Forgets the current session, there is nothing to tell the portal
    #[tracing::instrument(skip(self))]
    pub fn logout(&self) {
        if let Some(session) = self.current.lock().expect("mutex poisoned").take() {
            info!(username = %session.username(), "logged out");
        }
    }

    /// Drops `session` if it is still the current one.
    ///
    /// Used when the portal rejects a session during a fetch. A session that
    /// was replaced by a newer login in the meantime is left alone. Returns
    /// `true` if the current session was cleared.
    #[tracing::instrument(skip(self), ret)]
    pub fn invalidate(&self, session: &Arc<Session>) -> bool {
        let mut guard = self.current.lock().expect("mutex poisoned");
        match guard.as_ref() {
            Some(current) if Arc::ptr_eq(current, session) => {
                *guard = None;
                true
            }
            _ => false,
        }
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.current.lock().expect("mutex poisoned").clone()
    }

    pub fn current_user(&self) -> Option<Username> {
        self.current
            .lock()
            .expect("mutex poisoned")
            .as_ref()
            .map(|session| session.username().clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.lock().expect("mutex poisoned").is_some()
    }

    pub fn is_login_in_flight(&self) -> bool {
        self.login_in_flight.load(Ordering::Acquire)
    }
}
