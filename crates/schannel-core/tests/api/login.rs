use std::sync::Arc;

use schannel_core::{CredentialStore, RefreshError, RemoteError, SyncEvent};
use schannel_shared::{
    errors::ValidationError,
    uac::{AuthError, LoginError},
    user_config::{ProxyConfig, ProxyScheme, UserConfig},
};
use secrecy::ExposeSecret as _;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tokio_util::sync::CancellationToken;

use crate::helpers::{
    spawn_app, spawn_app_with_config, spawn_app_with_credentials, temp_db_path, OtherUser,
    TestUser,
};

#[tokio::test]
async fn login_success_stores_session() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let session = app.login().await;

    // Assert
    assert_eq!(session.username(), &TestUser::username());
    let current = app.controller.sessions().current_session().unwrap();
    assert!(Arc::ptr_eq(&current, &session));
    assert_eq!(app.remote.auth_calls(), 1);
    assert!(app.take_events().is_empty());
}

#[tokio::test]
async fn login_failure_keeps_existing_session() {
    // Arrange
    let app = spawn_app().await;
    let original = app.login().await;
    let login_args = TestUser::login_args().password("wrong-password".to_string().into());

    // Act
    let outcome = app.controller.login(login_args).await;

    // Assert
    assert!(matches!(
        outcome.unwrap_err(),
        LoginError::Auth(AuthError::InvalidCredentials)
    ));
    let current = app.controller.sessions().current_session().unwrap();
    assert!(Arc::ptr_eq(&current, &original));
}

#[tokio::test]
async fn login_failure_notifies_observers() {
    // Arrange
    let app = spawn_app().await;
    let login_args = TestUser::login_args().username("mallory@example.com".to_string());

    // Act
    let outcome = app.controller.login(login_args).await;

    // Assert
    assert_eq!(
        outcome.unwrap_err().to_string(),
        LoginError::Auth(AuthError::InvalidCredentials).to_string()
    );
    let events = app.take_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        SyncEvent::AuthFailed(AuthError::InvalidCredentials)
    ));
    assert!(!app.controller.sessions().is_logged_in());
}

#[tokio::test]
async fn concurrent_login_is_refused_while_first_in_flight() {
    // Arrange
    let app = spawn_app().await;
    let gate = app.remote.hold_logins();
    let controller = Arc::clone(&app.controller);
    let first = tokio::spawn(async move { controller.login(TestUser::login_args()).await });
    app.remote.wait_for_auth_calls(1).await;

    // Act
    let second = app.controller.login(TestUser::login_args()).await;
    gate.notify_one();
    let first = first.await.unwrap();

    // Assert
    assert!(second.unwrap_err().is_busy());
    assert!(first.is_ok());
    assert_eq!(app.remote.auth_calls(), 1);
    assert!(!app.controller.sessions().is_login_in_flight());
}

#[tokio::test]
async fn login_possible_again_after_in_flight_login_finishes() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;

    // Act
    let outcome = app.controller.login(TestUser::login_args()).await;

    // Assert
    assert!(outcome.is_ok());
    assert_eq!(app.remote.auth_calls(), 2);
}

#[tokio::test]
async fn invalid_input_is_rejected_without_remote_call() {
    // Arrange
    let app = spawn_app().await;
    let login_args = TestUser::login_args().username("   ".to_string());

    // Act
    let outcome = app.controller.login(login_args).await;

    // Assert
    assert!(matches!(
        outcome.unwrap_err(),
        LoginError::Validation(ValidationError::EmptyUsername)
    ));
    assert_eq!(app.remote.auth_calls(), 0);
}

#[tokio::test]
async fn remembered_password_is_saved_only_when_requested() {
    // Arrange
    let app = spawn_app().await;

    // Act
    app.controller
        .login(TestUser::login_args().remember(true))
        .await
        .unwrap();

    // Assert
    let password = app
        .controller
        .remembered_password(&TestUser::username())
        .await
        .unwrap()
        .expect("password should be remembered");
    assert_eq!(password.expose_secret(), TestUser::PASSWORD);
    assert_eq!(
        app.controller.known_users().await.unwrap(),
        vec![TestUser::username()]
    );
}

#[tokio::test]
async fn password_not_saved_without_remember() {
    // Arrange
    let app = spawn_app().await;

    // Act
    app.login().await;

    // Assert
    let password = app
        .controller
        .remembered_password(&TestUser::username())
        .await
        .unwrap();
    assert!(password.is_none());
    assert!(app.controller.known_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_uses_configured_proxy() {
    // Arrange
    let proxy = ProxyConfig::new(ProxyScheme::Socks5, "127.0.0.1", 1080);
    let app =
        spawn_app_with_config(Some(UserConfig::default().with_proxy(Some(proxy)))).await;

    // Act
    app.login().await;

    // Assert
    let used = app.remote.last_proxy().expect("proxy should be passed on");
    assert_eq!(used.host, "127.0.0.1");
    assert_eq!(used.port, 1080);
    assert_eq!(used.scheme, ProxyScheme::Socks5);
}

#[tokio::test]
async fn logout_clears_session_and_view() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;
    app.controller
        .refresh(&CancellationToken::new())
        .await
        .unwrap();
    assert!(app.controller.current_view().is_some());

    // Act
    app.controller.logout();

    // Assert
    assert!(!app.controller.sessions().is_logged_in());
    assert!(app.controller.current_view().is_none());
    let outcome = app.controller.refresh(&CancellationToken::new()).await;
    assert!(outcome.unwrap_err().partial_view().is_none());
}

#[tokio::test]
async fn failed_password_save_does_not_fail_login() {
    // Arrange
    let path = temp_db_path();
    let credentials = CredentialStore::open(&path).await.unwrap();
    let app = spawn_app_with_credentials(credentials);
    let other_connection = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&path))
        .await
        .unwrap();
    sqlx::query("DROP TABLE users;")
        .execute(&other_connection)
        .await
        .unwrap();
    other_connection.close().await;

    // Act
    let outcome = app
        .controller
        .login(TestUser::login_args().remember(true))
        .await;

    // Assert
    let session = outcome.expect("login should succeed even if the password is not saved");
    assert_eq!(session.username(), &TestUser::username());
    assert!(app.controller.sessions().is_logged_in());
    assert!(app
        .controller
        .remembered_password(&TestUser::username())
        .await
        .is_err());
}

#[tokio::test]
async fn login_as_other_user_drops_previous_view() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;
    let cancel = CancellationToken::new();
    app.controller.refresh(&cancel).await.unwrap();
    app.remote
        .set_service(Err(RemoteError::Network("reset".to_string())));
    app.remote
        .set_invoices(Err(RemoteError::Network("reset".to_string())));

    // Act
    let session = app.controller.login(OtherUser::login_args()).await.unwrap();
    let view_after_login = app.controller.current_view();
    let outcome = app.controller.refresh(&cancel).await;

    // Assert
    assert_eq!(session.username().as_ref(), OtherUser::USERNAME);
    assert!(view_after_login.is_none());
    let RefreshError::Partial(partial) = outcome.unwrap_err() else {
        panic!("expected a partial refresh");
    };
    assert!(partial.view.service.is_missing());
    assert!(partial.view.invoices.is_missing());
    // The previous account's service must not be used to fetch nodes
    assert!(partial.view.ssr_info.is_missing());
    assert_eq!(app.remote.fetch_calls(), 3 + 2);
}

#[tokio::test]
async fn login_again_as_same_user_keeps_previous_view() {
    // Arrange
    let app = spawn_app().await;
    app.login().await;
    let cancel = CancellationToken::new();
    app.controller.refresh(&cancel).await.unwrap();
    app.remote
        .set_invoices(Err(RemoteError::Network("reset".to_string())));

    // Act
    app.login().await;
    let outcome = app.controller.refresh(&cancel).await;

    // Assert
    let view = outcome.unwrap_err().partial_view().cloned().unwrap();
    assert!(view.invoices.is_stale());
    assert!(view.service.is_fresh());
}
