// SPDX-License-Identifier: MIT

//! Single-flight refresh: N concurrent 401s produce exactly one refresh
//! call, and every original request is replayed once with the new token.

use atrium_session::refresh::{DefaultBearer, RefreshCoordinator};
use atrium_session::CredentialStore;
use mockito::Matcher;
use serde_json::json;
use std::sync::{Arc, RwLock};
use std::time::Duration;

mod common;
use common::{login_as, session_for, test_profile};

fn coordinator_for(server: &mockito::ServerGuard, store: Arc<CredentialStore>) -> (RefreshCoordinator, DefaultBearer) {
    let bearer: DefaultBearer = Arc::new(RwLock::new(None));
    let coordinator = RefreshCoordinator::new(
        reqwest::Client::new(),
        &format!("{}/id", server.url()),
        Duration::from_secs(2),
        store,
        bearer.clone(),
    );
    (coordinator, bearer)
}

#[tokio::test]
async fn test_concurrent_401s_trigger_one_refresh() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);
    login_as(&session, "old");

    // Expired-token responses for the original requests
    server
        .mock("GET", "/docs/doc/documents/")
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("POST", "/chat/query/")
        .match_header("authorization", "Bearer old")
        .with_status(401)
        .create_async()
        .await;

    // Exactly one refresh call, carrying the stored refresh token
    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .match_body(Matcher::PartialJson(json!({ "refresh": "refresh-1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access": "new"}"#)
        .expect(1)
        .create_async()
        .await;

    // Replays succeed with the refreshed credential
    let docs_replay = server
        .mock("GET", "/docs/doc/documents/")
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;
    let chat_replay = server
        .mock("POST", "/chat/query/")
        .match_header("authorization", "Bearer new")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"conversation_id": "c1", "message": "hi"}"#)
        .expect(1)
        .create_async()
        .await;

    // Scenario A: two views fire simultaneously, both hit a 401
    let (docs, reply) = tokio::join!(
        session.documents().list(),
        session.chat().send_message("hello", None),
    );

    assert!(docs.unwrap().is_empty());
    assert_eq!(reply.unwrap().message.as_deref(), Some("hi"));

    refresh_mock.assert_async().await;
    docs_replay.assert_async().await;
    chat_replay.assert_async().await;

    // The coordinator wrote the new token back to the store
    assert_eq!(session.store().access_token().as_deref(), Some("new"));
    assert!(session.store().is_authenticated());
}

#[tokio::test]
async fn test_tenant_header_attached_on_every_request() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);
    login_as(&session, "tok");

    let docs_mock = server
        .mock("GET", "/docs/doc/documents/")
        .match_header("authorization", "Bearer tok")
        .match_header("x-tenant-id", "t-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    session.documents().list().await.unwrap();
    docs_mock.assert_async().await;
}

#[tokio::test]
async fn test_late_401_reuses_completed_refresh() {
    let mut server = mockito::Server::new_async().await;

    // An earlier cycle already rotated the credential
    let store = Arc::new(CredentialStore::new());
    store.set_session("new".to_string(), Some("refresh-1".to_string()), test_profile());
    let (coordinator, _bearer) = coordinator_for(&server, store.clone());

    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .expect(0)
        .create_async()
        .await;

    // A 401 earned by the old credential lands after that cycle finished;
    // the current token is handed back without a second refresh
    let token = coordinator
        .refresh_access_token(Some("old"))
        .await
        .unwrap();
    assert_eq!(token, "new");
    refresh_mock.assert_async().await;
    assert_eq!(store.access_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_matching_stale_token_still_refreshes() {
    let mut server = mockito::Server::new_async().await;

    let store = Arc::new(CredentialStore::new());
    store.set_session("old".to_string(), Some("refresh-1".to_string()), test_profile());
    let (coordinator, bearer) = coordinator_for(&server, store.clone());

    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .match_body(Matcher::PartialJson(json!({ "refresh": "refresh-1" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access": "newer"}"#)
        .expect(1)
        .create_async()
        .await;

    // The stored token is the one the 401 was earned with: a real refresh
    let token = coordinator
        .refresh_access_token(Some("old"))
        .await
        .unwrap();
    assert_eq!(token, "newer");
    refresh_mock.assert_async().await;
    assert_eq!(store.access_token().as_deref(), Some("newer"));
    assert_eq!(bearer.read().unwrap().as_deref(), Some("newer"));
}

#[tokio::test]
async fn test_second_401_after_refresh_is_surfaced_not_looped() {
    let mut server = mockito::Server::new_async().await;
    let session = session_for(&server);
    login_as(&session, "old");

    // The backend keeps rejecting even the refreshed token
    server
        .mock("GET", "/docs/doc/documents/")
        .with_status(401)
        .create_async()
        .await;

    let refresh_mock = server
        .mock("POST", "/id/auth/token/refresh/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access": "new"}"#)
        .expect(1)
        .create_async()
        .await;

    let err = session.documents().list().await.unwrap_err();
    assert!(err.is_auth_expired(), "expected AuthExpired, got {:?}", err);

    // One refresh, one replay, no loop
    refresh_mock.assert_async().await;
}
