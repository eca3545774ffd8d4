//! Keeps the account view, the node selection and the persisted config in
//! step with the portal

use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use schannel_shared::{
    account::{NodeId, Service},
    const_config::session::SESSION_AGE_WARNING,
    errors::NotLoggedInError,
    log_err_as_warn,
    req_args::LoginReqArgs,
    session::Session,
    uac::{AuthError, LoginError, Username},
    user_config::{ProxyConfig, UserConfig},
};
use schannel_time::Seconds;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config_store::{ConfigError, ConfigStore},
    credential_store::{CredentialStore, CredentialStoreError},
    remote::{RemoteAccountClient, RemoteError},
    session_manager::SessionManager,
};

mod errors;
mod observer;
mod reconcile;
mod view;

pub use errors::{
    FetchCause, FetchError, FetchTarget, InvalidSelectionError, NodeSwitchError, PartialRefresh,
    RefreshError, RefreshFailure,
};
pub use observer::{ObserverId, SyncEvent, SyncObserver};
pub use view::{AggregateView, Snapshot};

use reconcile::reconcile_selection;

/// The orchestrator the front end talks to.
///
/// Drives login, runs refresh cycles, reconciles the selected node with the
/// node list from the portal and tells observers about every change.
pub struct SyncController<R, C> {
    remote: Arc<R>,
    sessions: SessionManager<R>,
    config_store: C,
    credentials: CredentialStore,
    fetch_timeout: Seconds,
    state: Mutex<SyncState>,
    observers: Mutex<Vec<(ObserverId, Arc<dyn SyncObserver>)>>,
    next_observer_id: AtomicU64,
}

#[derive(Debug, Default)]
struct SyncState {
    config: UserConfig,
    /// Last view handed out, also the source of stale values for failed
    /// fetches
    view: Option<AggregateView>,
    /// Account `view` was built for
    view_owner: Option<Username>,
}

impl SyncState {
    /// The cached view, only if it belongs to `username`
    fn view_for(&self, username: &Username) -> Option<&AggregateView> {
        self.view
            .as_ref()
            .filter(|_| self.view_owner.as_ref() == Some(username))
    }

    fn clear_view(&mut self) {
        self.view = None;
        self.view_owner = None;
    }
}

impl<R, C> SyncController<R, C>
where
    R: RemoteAccountClient,
    C: ConfigStore,
{
    /// Loads the user config, a missing file starts from the defaults but a
    /// file that cannot be parsed is reported
    #[tracing::instrument(name = "NEW SYNC-CONTROLLER", skip(remote, config_store, credentials), err(Debug))]
    pub fn new(
        remote: Arc<R>,
        config_store: C,
        credentials: CredentialStore,
        fetch_timeout: Seconds,
    ) -> Result<Self, ConfigError> {
        let config = config_store.load_or_default()?;
        Ok(Self {
            sessions: SessionManager::new(Arc::clone(&remote)),
            remote,
            config_store,
            credentials,
            fetch_timeout,
            state: Mutex::new(SyncState {
                config,
                ..Default::default()
            }),
            observers: Default::default(),
            next_observer_id: AtomicU64::new(0),
        })
    }

    pub fn sessions(&self) -> &SessionManager<R> {
        &self.sessions
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn config(&self) -> UserConfig {
        self.state.lock().expect("mutex poisoned").config.clone()
    }

    pub fn current_view(&self) -> Option<AggregateView> {
        self.state.lock().expect("mutex poisoned").view.clone()
    }

    pub fn register_observer<F: SyncObserver>(&self, observer: F) -> ObserverId {
        let id = ObserverId::from(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        let observer: Arc<dyn SyncObserver> = Arc::new(observer);
        self.observers
            .lock()
            .expect("mutex poisoned")
            .push((id, observer));
        id
    }

    /// Returns `false` if no observer with this id was registered
    pub fn unregister_observer(&self, id: ObserverId) -> bool {
        let mut guard = self.observers.lock().expect("mutex poisoned");
        let len_before = guard.len();
        guard.retain(|(observer_id, _)| *observer_id != id);
        guard.len() != len_before
    }

    /// Logs in with the proxy from the user config.
    ///
    /// On success the password is saved if the user asked to be remembered,
    /// failing to save it does not fail the login. A view cached for another
    /// account is dropped. Authentication failures are also sent to
    /// observers.
    #[tracing::instrument(skip(self), err(Debug))]
    pub async fn login(&self, args: LoginReqArgs) -> Result<Arc<Session>, LoginError> {
        let proxy = self.config().proxy;
        match self.sessions.login(&args, proxy.as_ref()).await {
            Ok(session) => {
                {
                    let mut state = self.state.lock().expect("mutex poisoned");
                    if state.view_owner.as_ref() != Some(session.username()) {
                        state.clear_view();
                    }
                }
                if args.remember {
                    log_err_as_warn!(
                        self.credentials
                            .save_password(session.username(), &args.password)
                            .await
                    );
                }
                Ok(session)
            }
            Err(LoginError::Auth(err)) => {
                self.notify(&SyncEvent::AuthFailed(err.clone()));
                Err(LoginError::Auth(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Drops the session and the view that belonged to it
    #[tracing::instrument(skip(self))]
    pub fn logout(&self) {
        self.sessions.logout();
        self.state.lock().expect("mutex poisoned").clear_view();
    }

    /// Refreshes everything using the current session
    #[tracing::instrument(skip(self, cancel), err(Debug))]
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<AggregateView, RefreshError> {
        let session = self.sessions.current_session().ok_or(NotLoggedInError)?;
        Ok(self.refresh_all(&session, None, cancel).await?)
    }

    /// Runs one refresh cycle.
    ///
    /// The service is only fetched if not supplied. The invoice fetch runs at
    /// the same time as the service/node fetches. A failed fetch does not stop
    /// the others: its field is marked stale (or missing) and the failure is
    /// reported in the returned error together with the partial view.
    ///
    /// If `session` stopped being the current session before the fetches
    /// finished (logout or another login) the result is returned but neither
    /// kept nor sent to observers.
    #[tracing::instrument(skip(self, session, service, cancel), fields(username = %session.username()))]
    pub async fn refresh_all(
        &self,
        session: &Arc<Session>,
        service: Option<Service>,
        cancel: &CancellationToken,
    ) -> Result<AggregateView, PartialRefresh> {
        if session.age() > SESSION_AGE_WARNING {
            warn!(
                age = %session.age(),
                created_at = ?session.created_at().as_utc_datetime(),
                "refreshing with an old session"
            );
        }
        let username = session.username();
        let timeout: Duration = self.fetch_timeout.into();
        let cached_service = self.cached_service(username);

        let invoices = guarded(
            FetchTarget::Invoices,
            cancel,
            timeout,
            self.remote.fetch_invoices(session),
        );
        let service_and_nodes = async {
            let service = match service {
                Some(service) => Ok(service),
                None => {
                    guarded(
                        FetchTarget::Service,
                        cancel,
                        timeout,
                        self.remote.fetch_service(session),
                    )
                    .await
                }
            };
            // The node list only needs the service id so an older copy will do
            let service_for_nodes = service.as_ref().ok().or(cached_service.as_ref());
            let nodes = match service_for_nodes {
                Some(for_nodes) => {
                    guarded(
                        FetchTarget::SsrInfo,
                        cancel,
                        timeout,
                        self.remote.fetch_ssr_info(session, for_nodes),
                    )
                    .await
                }
                None => Err(FetchError::new(
                    FetchTarget::SsrInfo,
                    FetchCause::ServiceUnavailable,
                )),
            };
            (service, nodes)
        };
        let (invoices, (service, ssr_info)) = tokio::join!(invoices, service_and_nodes);

        let mut failures: Vec<RefreshFailure> = Vec::new();
        let mut events = Vec::new();
        let session_rejected = [
            service.as_ref().err(),
            invoices.as_ref().err(),
            ssr_info.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .any(FetchError::is_unauthorized);

        let (view, is_current, selection_changed) = {
            let mut state = self.state.lock().expect("mutex poisoned");
            let is_current = self
                .sessions
                .current_session()
                .is_some_and(|current| Arc::ptr_eq(&current, session));
            let previous = state.view_for(username);

            let service = match service {
                Ok(value) => Snapshot::Fresh(value),
                Err(err) => {
                    failures.push(err.into());
                    Snapshot::fallback(previous.map(|v| &v.service))
                }
            };
            let invoices = match invoices {
                Ok(value) => Snapshot::Fresh(value),
                Err(err) => {
                    failures.push(err.into());
                    Snapshot::fallback(previous.map(|v| &v.invoices))
                }
            };
            let ssr_info = match ssr_info {
                Ok(value) => Snapshot::Fresh(value),
                Err(err) => {
                    failures.push(err.into());
                    Snapshot::fallback(previous.map(|v| &v.ssr_info))
                }
            };

            let mut view = AggregateView {
                service,
                invoices,
                ssr_info,
                selection: state.config.selected_node.clone(),
            };
            let mut selection_changed = false;
            if is_current {
                // Only a freshly fetched node list may move the selection
                if let Snapshot::Fresh(info) = &view.ssr_info {
                    let current = state.config.selected_node.as_ref();
                    let reconciled = reconcile_selection(current, info);
                    if reconciled.as_ref() != current {
                        info!(from = ?current, to = ?reconciled, "selected node reconciled");
                        state.config = state.config.clone().with_selected_node(reconciled);
                        view.selection = state.config.selected_node.clone();
                        selection_changed = true;
                    }
                }
                state.view = Some(view.clone());
                state.view_owner = Some(username.clone());
            } else {
                info!("session replaced while refreshing, result not kept");
            }
            (view, is_current, selection_changed)
        };

        // Written outside the lock, saves the latest config in case it changed
        // again in the meantime
        if selection_changed {
            let config = self.config();
            if let Err(err) = self.config_store.save(&config) {
                warn!(?err, "failed to persist reconciled node selection");
                failures.push(RefreshFailure::Persist(err));
            }
            events.push(SyncEvent::ConfigChanged(config));
        }

        if session_rejected && self.sessions.invalidate(session) {
            events.push(SyncEvent::AuthFailed(AuthError::SessionExpired));
        }
        if is_current && view.has_fresh_data() {
            events.insert(0, SyncEvent::ViewChanged(view.clone()));
        }
        for event in &events {
            self.notify(event);
        }

        if failures.is_empty() {
            Ok(view)
        } else {
            Err(PartialRefresh {
                view: Box::new(view),
                failures,
            })
        }
    }

    /// Makes `node_id` the selected node.
    ///
    /// Only nodes in the latest known node list are accepted. This is a local
    /// change only, nothing is sent to the portal.
    #[tracing::instrument(skip(self), err(Debug))]
    pub fn request_node_switch(&self, node_id: &NodeId) -> Result<(), NodeSwitchError> {
        let (config, view) = {
            let mut state = self.state.lock().expect("mutex poisoned");
            let is_known = state
                .view
                .as_ref()
                .and_then(|view| view.ssr_info.value())
                .is_some_and(|info| info.contains(node_id));
            if !is_known {
                return Err(InvalidSelectionError {
                    node_id: node_id.clone(),
                }
                .into());
            }
            if state.config.selected_node.as_ref() == Some(node_id) {
                return Ok(());
            }

            let new_config = state
                .config
                .clone()
                .with_selected_node(Some(node_id.clone()));
            self.config_store.save(&new_config)?;
            state.config = new_config;
            let view = state.view.as_mut().map(|view| {
                view.selection = Some(node_id.clone());
                view.clone()
            });
            (state.config.clone(), view)
        };
        info!(%node_id, "switched node");

        self.notify(&SyncEvent::ConfigChanged(config));
        if let Some(view) = view {
            self.notify(&SyncEvent::ViewChanged(view));
        }
        Ok(())
    }

    /// Replaces the proxy used for future logins
    #[tracing::instrument(skip(self), err(Debug))]
    pub fn update_proxy(&self, proxy: Option<ProxyConfig>) -> Result<(), ConfigError> {
        let config = {
            let mut state = self.state.lock().expect("mutex poisoned");
            let new_config = state.config.clone().with_proxy(proxy);
            self.config_store.save(&new_config)?;
            state.config = new_config;
            state.config.clone()
        };
        self.notify(&SyncEvent::ConfigChanged(config));
        Ok(())
    }

    /// Password to prefill for `username`, if one was remembered
    pub async fn remembered_password(
        &self,
        username: &Username,
    ) -> Result<Option<SecretString>, CredentialStoreError> {
        self.credentials.load_password(username).await
    }

    /// Users to suggest on the login prompt, oldest first
    pub async fn known_users(&self) -> Result<Vec<Username>, CredentialStoreError> {
        self.credentials.list_known_users().await
    }

    fn cached_service(&self, username: &Username) -> Option<Service> {
        self.state
            .lock()
            .expect("mutex poisoned")
            .view_for(username)
            .and_then(|view| view.service.value().cloned())
    }

    /// Calls observers without holding any lock so they may call back into
    /// the controller
    fn notify(&self, event: &SyncEvent) {
        let observers: Vec<_> = self
            .observers
            .lock()
            .expect("mutex poisoned")
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(event);
        }
    }
}

/// Runs one fetch bounded by the cancellation token and the timeout
async fn guarded<T, F>(
    target: FetchTarget,
    cancel: &CancellationToken,
    timeout: Duration,
    fetch: F,
) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    let cause = tokio::select! {
        biased;
        _ = cancel.cancelled() => FetchCause::Cancelled,
        result = tokio::time::timeout(timeout, fetch) => match result {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => FetchCause::Remote(err),
            Err(_elapsed) => FetchCause::TimedOut,
        },
    };
    warn!(%target, %cause, "fetch failed");
    Err(FetchError::new(target, cause))
}
