// SPDX-License-Identifier: MIT

//! Shared helpers for mock-backed session tests.

use atrium_session::models::{Role, UserProfile};
use atrium_session::{Config, Session};
use std::time::Duration;

/// Profile used across tests; tenant-scoped so the tenant header is exercised.
#[allow(dead_code)]
pub fn test_profile() -> UserProfile {
    UserProfile {
        id: "u-1".to_string(),
        email: "user@example.com".to_string(),
        name: Some("Test User".to_string()),
        role: Role::TenantAdmin,
        tenant_id: Some("t-1".to_string()),
        is_verified: true,
        is_active: true,
    }
}

/// Session with all three connections pointed at one mock server, under
/// distinct path prefixes so routes stay distinguishable.
#[allow(dead_code)]
pub fn session_for(server: &mockito::ServerGuard) -> Session {
    session_with_interval(server, Duration::from_millis(25))
}

/// Same, with an explicit poll interval. Tests that drive `poll_tick`
/// manually pass a long interval so the background timer stays quiet.
#[allow(dead_code)]
pub fn session_with_interval(server: &mockito::ServerGuard, poll_interval: Duration) -> Session {
    let url = server.url();
    let config = Config {
        identity_base_url: format!("{}/id", url),
        chat_base_url: format!("{}/chat", url),
        docs_base_url: format!("{}/docs", url),
        poll_interval,
        refresh_timeout: Duration::from_secs(2),
    };
    Session::new(config)
}

/// Install an authenticated session directly into the store.
#[allow(dead_code)]
pub fn login_as(session: &Session, access: &str) {
    session
        .store()
        .set_session(access.to_string(), Some("refresh-1".to_string()), test_profile());
}
