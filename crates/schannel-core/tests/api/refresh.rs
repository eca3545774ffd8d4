use std::{sync::Arc, time::Duration};

use schannel_core::{FetchCause, FetchTarget, RefreshError, RefreshFailure, Snapshot, SyncEvent};
use schannel_shared::{
    uac::AuthError,
    user_config::UserConfig,
};
use schannel_time::Seconds;
use tokio_util::sync::CancellationToken;

use crate::helpers::{invoices, service, spawn_app, spawn_app_with, spawn_app_with_config, ssr_info};

fn config_selecting(node_id: &str) -> Option<UserConfig> {
    Some(UserConfig::default().with_selected_node(Some(node_id.into())))
}

#[tokio::test]
async fn complete_refresh_produces_fresh_view() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;

    // Act
    let view = app
        .controller
        .refresh(&CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert!(view.is_complete());
    assert_eq!(view.service.value(), Some(&service()));
    assert_eq!(view.invoices.value(), Some(&invoices()));
    assert_eq!(view.nodes().len(), 3);
    assert!(view.has_unpaid_invoices());
    assert_eq!(app.remote.fetch_calls(), 3);
}

#[tokio::test]
async fn removed_node_falls_back_to_first_and_is_saved_once() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-5")).await;
    app.login().await;

    // Act
    let view = app
        .controller
        .refresh(&CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert_eq!(view.selection.as_ref().map(|id| id.as_str()), Some("node-1"));
    assert_eq!(view.selected_node().unwrap().name, "Relay node-1");
    assert_eq!(app.selected_node().as_deref(), Some("node-1"));
    assert_eq!(app.config_store.saves(), 1);
    let stored = app.config_store.stored().unwrap();
    assert_eq!(stored.selected_node.unwrap().as_str(), "node-1");
    let events = app.take_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], SyncEvent::ViewChanged(view) if view.is_complete()));
    assert!(matches!(
        &events[1],
        SyncEvent::ConfigChanged(config) if config.selected_node.as_ref().map(|id| id.as_str()) == Some("node-1")
    ));
}

#[tokio::test]
async fn reconciliation_is_idempotent() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-5")).await;
    app.login().await;
    let cancel = CancellationToken::new();
    app.controller.refresh(&cancel).await.unwrap();
    app.take_events();

    // Act
    app.controller.refresh(&cancel).await.unwrap();

    // Assert
    assert_eq!(app.selected_node().as_deref(), Some("node-1"));
    assert_eq!(app.config_store.saves(), 1);
    let events = app.take_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], SyncEvent::ViewChanged(_)));
}

#[tokio::test]
async fn selection_still_offered_is_kept() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-2")).await;
    app.login().await;

    // Act
    let view = app
        .controller
        .refresh(&CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert_eq!(view.selected_node().unwrap().id.as_str(), "node-2");
    assert_eq!(app.config_store.saves(), 0);
}

#[tokio::test]
async fn empty_node_list_clears_selection() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-2")).await;
    app.remote.set_ssr_info(Ok(ssr_info(&[])));
    app.login().await;

    // Act
    let view = app
        .controller
        .refresh(&CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert!(view.selection.is_none());
    assert!(view.nodes().is_empty());
    assert!(app.selected_node().is_none());
    assert_eq!(app.config_store.saves(), 1);
}

#[tokio::test]
async fn failed_fetch_does_not_stop_the_others() {
    // Arrange
    let app = spawn_app().await;
    app.remote
        .set_invoices(Err(schannel_core::RemoteError::Network("reset".to_string())));
    app.login().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    assert_eq!(partial.failed_targets(), vec![FetchTarget::Invoices]);
    assert!(partial.view.service.is_fresh());
    assert!(partial.view.ssr_info.is_fresh());
    assert!(partial.view.invoices.is_missing());
    assert_eq!(partial.view.selection.as_ref().unwrap().as_str(), "node-1");
    let events = app.take_events();
    assert!(matches!(&events[0], SyncEvent::ViewChanged(view) if !view.is_complete()));
}

#[tokio::test]
async fn failed_fetch_keeps_previous_value_as_stale() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;
    let cancel = CancellationToken::new();
    app.controller.refresh(&cancel).await.unwrap();
    app.remote
        .set_invoices(Err(schannel_core::RemoteError::Unavailable("503".to_string())));

    // Act
    let outcome = app.controller.refresh(&cancel).await;

    // Assert
    let view = outcome.unwrap_err().partial_view().cloned().unwrap();
    assert!(matches!(&view.invoices, Snapshot::Stale(list) if *list == invoices()));
    assert!(view.service.is_fresh());
    assert!(app.controller.current_view().unwrap().invoices.is_stale());
}

#[tokio::test]
async fn failed_service_fetch_uses_cached_service_for_nodes() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;
    let cancel = CancellationToken::new();
    app.controller.refresh(&cancel).await.unwrap();
    app.remote
        .set_service(Err(schannel_core::RemoteError::InvalidResponse("no table".to_string())));

    // Act
    let outcome = app.controller.refresh(&cancel).await;

    // Assert
    let view = outcome.unwrap_err().partial_view().cloned().unwrap();
    assert!(view.service.is_stale());
    assert!(view.ssr_info.is_fresh());
    assert!(view.invoices.is_fresh());
}

#[tokio::test]
async fn failed_service_fetch_without_cache_skips_nodes() {
    // Arrange
    let app = spawn_app().await;
    app.remote
        .set_service(Err(schannel_core::RemoteError::Network("refused".to_string())));
    app.login().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    assert_eq!(
        partial.failed_targets(),
        vec![FetchTarget::Service, FetchTarget::SsrInfo]
    );
    let ssr_error = partial
        .fetch_errors()
        .find(|err| err.target == FetchTarget::SsrInfo)
        .unwrap();
    assert_eq!(ssr_error.cause, FetchCause::ServiceUnavailable);
    assert!(partial.view.ssr_info.is_missing());
    assert!(partial.view.invoices.is_fresh());
    assert_eq!(app.remote.fetch_calls(), 2);
}

#[tokio::test]
async fn supplied_service_is_not_fetched_again() {
    // Arrange
    let app = spawn_app().await;
    let session = app.login().await;

    // Act
    let view = app
        .controller
        .refresh_all(&session, Some(service()), &CancellationToken::new())
        .await
        .unwrap();

    // Assert
    assert!(view.is_complete());
    assert_eq!(app.remote.fetch_calls(), 2);
}

#[tokio::test]
async fn cancelled_refresh_reports_every_fetch_cancelled() {
    // Arrange
    let app = spawn_app().await;
    app.remote.set_fetch_delay(Duration::from_secs(60));
    app.login().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    // Act
    let outcome = app.controller.refresh(&cancel).await;

    // Assert
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    let causes: Vec<_> = partial.fetch_errors().map(|err| err.cause.clone()).collect();
    assert_eq!(
        causes,
        vec![
            FetchCause::Cancelled,
            FetchCause::Cancelled,
            FetchCause::ServiceUnavailable
        ]
    );
    assert!(!partial.view.has_fresh_data());
    assert!(app.take_events().is_empty());
}

#[tokio::test]
async fn slow_fetch_times_out() {
    // Arrange
    let app = spawn_app_with(None, Seconds::new(1)).await;
    app.remote.set_fetch_delay(Duration::from_secs(30));
    app.login().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    assert!(partial
        .fetch_errors()
        .filter(|err| err.target != FetchTarget::SsrInfo)
        .all(|err| err.cause == FetchCause::TimedOut));
}

#[tokio::test]
async fn rejected_session_is_invalidated() {
    // Arrange
    let app = spawn_app().await;
    app.remote
        .set_invoices(Err(schannel_core::RemoteError::Unauthorized));
    app.login().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    assert!(outcome.is_err());
    assert!(!app.controller.sessions().is_logged_in());
    let events = app.take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, SyncEvent::AuthFailed(AuthError::SessionExpired))));
    let outcome = app.controller.refresh(&CancellationToken::new()).await;
    assert!(matches!(outcome.unwrap_err(), RefreshError::NotLoggedIn(_)));
}

#[tokio::test]
async fn refresh_without_login_is_refused() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    assert!(matches!(outcome.unwrap_err(), RefreshError::NotLoggedIn(_)));
    assert_eq!(app.remote.fetch_calls(), 0);
}

#[tokio::test]
async fn failed_save_still_updates_selection_in_memory() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-5")).await;
    app.config_store.fail_saves(true);
    app.login().await;

    // Act
    let outcome = app.controller.refresh(&CancellationToken::new()).await;

    // Assert
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    assert!(partial.failed_targets().is_empty());
    assert!(matches!(partial.failures[0], RefreshFailure::Persist(_)));
    assert_eq!(app.selected_node().as_deref(), Some("node-1"));
    assert_eq!(
        app.config_store.stored().unwrap().selected_node.unwrap().as_str(),
        "node-5"
    );
}

#[tokio::test]
async fn refresh_overtaken_by_logout_is_discarded() {
    // Arrange
    let app = spawn_app_with_config(config_selecting("node-5")).await;
    app.remote.set_fetch_delay(Duration::from_millis(200));
    app.login().await;
    let controller = Arc::clone(&app.controller);
    let refresh =
        tokio::spawn(async move { controller.refresh(&CancellationToken::new()).await });
    app.remote.wait_for_fetch_calls(1).await;

    // Act
    app.controller.logout();
    let outcome = refresh.await.unwrap();

    // Assert
    let view = outcome.expect("every fetch succeeded");
    assert!(view.is_complete());
    assert!(app.controller.current_view().is_none());
    assert_eq!(app.selected_node().as_deref(), Some("node-5"));
    assert_eq!(app.config_store.saves(), 0);
    assert!(app.take_events().is_empty());
}
