// SPDX-License-Identifier: MIT

//! Terminal refresh failures: the store is cleared wholesale and the
//! session-ended signal fires. No retry beyond the single refresh cycle.

use atrium_session::{ApiError, SessionStatus};
use std::io::Write;
use std::time::Duration;

mod common;
use common::{login_as, session_for};

#[tokio::test]
async fn test_refresh_rejection_ends_session() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);
    login_as(&session, "old");
    session.store().set_pending_email("new@example.com".to_string());

    server
        .mock("GET", "/docs/doc/documents/")
        .with_status(401)
        .create_async()
        .await;

    // Scenario B: the refresh endpoint itself 401s
    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthTerminal));
    refresh_mock.assert_async().await;

    // Store cleared wholesale, including transient per-session values
    assert!(!session.store().is_authenticated());
    assert!(session.store().access_token().is_none());
    assert!(session.store().refresh_token().is_none());
    assert!(session.store().user().is_none());
    assert!(session.store().subscription().is_none());
    assert!(session.store().pending_email().is_none());

    // Forced-logout signal observed
    assert_eq!(*session.status().borrow(), SessionStatus::Ended);
}

#[tokio::test]
async fn test_missing_access_field_is_a_failure() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);
    login_as(&session, "old");

    server
        .mock("GET", "/docs/doc/documents/")
        .with_status(401)
        .create_async()
        .await;

    // 200 without `access` must not be treated as a success
    server
        .mock("POST", "/id/auth/token/refresh/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "ok"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthTerminal));
    assert!(!session.store().is_authenticated());
    assert_eq!(*session.status().borrow(), SessionStatus::Ended);
}

#[tokio::test]
async fn test_401_without_refresh_token_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);

    // Token and profile but no refresh token stored
    session
        .store()
        .set_session("old".to_string(), None, common::test_profile());

    server
        .mock("GET", "/docs/doc/documents/")
        .with_status(401)
        .create_async()
        .await;

    // The refresh endpoint is never called
    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthTerminal));
    refresh_mock.assert_async().await;
    assert!(!session.store().is_authenticated());
}

#[tokio::test]
async fn test_hung_refresh_times_out_and_ends_session() {
    let mut server = mockito::Server::new_async().await;

    let config = atrium_session::Config {
        identity_base_url: format!("{}/id", server.url()),
        chat_base_url: format!("{}/chat", server.url()),
        docs_base_url: format!("{}/docs", server.url()),
        refresh_timeout: Duration::from_millis(100),
        ..atrium_session::Config::default()
    };
    let session = atrium_session::Session::new(config);
    login_as(&session, "old");

    server
        .mock("GET", "/docs/doc/documents/")
        .with_status(401)
        .create_async()
        .await;

    // The refresh endpoint accepts the request but the body never arrives
    // within the configured bound
    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .with_header("content-type", "application/json")
        .with_chunked_body(|writer| {
            std::thread::sleep(Duration::from_millis(500));
            writer.write_all(br#"{"access": "late"}"#)
        })
        .expect(1)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthTerminal), "got {:?}", err);
    refresh_mock.assert_async().await;

    // Timeout is terminal like any other refresh failure
    assert!(!session.store().is_authenticated());
    assert!(session.store().refresh_token().is_none());
    assert_eq!(*session.status().borrow(), SessionStatus::Ended);
}

#[tokio::test]
async fn test_network_error_never_enters_refresh_path() {
    let mut server = mockito::Server::new_async().await;

    // Documents backend is unreachable; identity backend is mocked so a
    // (wrong) refresh attempt would be visible.
    let config = atrium_session::Config {
        identity_base_url: format!("{}/id", server.url()),
        docs_base_url: "http://127.0.0.1:1/docs".to_string(),
        ..atrium_session::Config::default()
    };
    let session = atrium_session::Session::new(config);
    login_as(&session, "tok");

    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);

    // Session state untouched by a connectivity failure
    assert!(session.store().is_authenticated());
    refresh_mock.assert_async().await;
}
