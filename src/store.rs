// SPDX-License-Identifier: MIT

//! Credential store: the single source of truth for session state.
//!
//! Pure state holder with synchronous accessors; no network or UI side
//! effects. The refresh coordinator is the only writer of the access token
//! during a refresh cycle, and the auth attachment reads through on every
//! request, so a mid-flight token update is visible to the next request.

use crate::models::{AccessClaims, SubscriptionSnapshot, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct CredentialRecord {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserProfile>,
    subscription: Option<SubscriptionSnapshot>,
    /// Email awaiting verification (transient, cleared with the rest)
    pending_email: Option<String>,
}

/// Serializable session snapshot for persistence by the host application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    pub subscription: Option<SubscriptionSnapshot>,
    pub pending_email: Option<String>,
}

/// Thread-safe credential store shared by every connection.
#[derive(Debug, Default)]
pub struct CredentialStore {
    record: RwLock<CredentialRecord>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Token pair ──────────────────────────────────────────────────────

    pub fn access_token(&self) -> Option<String> {
        self.record.read().unwrap().access_token.clone()
    }

    pub fn set_access_token(&self, token: String) {
        self.record.write().unwrap().access_token = Some(token);
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.record.read().unwrap().refresh_token.clone()
    }

    pub fn set_refresh_token(&self, token: String) {
        self.record.write().unwrap().refresh_token = Some(token);
    }

    // ─── Profile ─────────────────────────────────────────────────────────

    pub fn user(&self) -> Option<UserProfile> {
        self.record.read().unwrap().user.clone()
    }

    /// Replace the profile snapshot wholesale.
    pub fn set_user(&self, user: UserProfile) {
        self.record.write().unwrap().user = Some(user);
    }

    // ─── Subscription cache ──────────────────────────────────────────────

    pub fn subscription(&self) -> Option<SubscriptionSnapshot> {
        self.record.read().unwrap().subscription.clone()
    }

    pub fn set_subscription(&self, subscription: SubscriptionSnapshot) {
        self.record.write().unwrap().subscription = Some(subscription);
    }

    // ─── Pending verification email ──────────────────────────────────────

    pub fn pending_email(&self) -> Option<String> {
        self.record.read().unwrap().pending_email.clone()
    }

    pub fn set_pending_email(&self, email: String) {
        self.record.write().unwrap().pending_email = Some(email);
    }

    pub fn remove_pending_email(&self) {
        self.record.write().unwrap().pending_email = None;
    }

    // ─── Session lifecycle ───────────────────────────────────────────────

    /// Install a full session after login/registration.
    ///
    /// Token and profile land under one write lock, so the invariant that
    /// they are both present or both absent holds at every observable point.
    pub fn set_session(&self, access: String, refresh: Option<String>, user: UserProfile) {
        let mut record = self.record.write().unwrap();
        record.access_token = Some(access);
        if let Some(refresh) = refresh {
            record.refresh_token = Some(refresh);
        }
        record.user = Some(user);
    }

    /// True iff both a non-empty access token and a profile are present.
    pub fn is_authenticated(&self) -> bool {
        let record = self.record.read().unwrap();
        record
            .access_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
            && record.user.is_some()
    }

    /// Wipe every field, including transient per-session values, under a
    /// single write lock. Partial clears are the bug class this exists to
    /// rule out.
    pub fn clear(&self) {
        let mut record = self.record.write().unwrap();
        *record = CredentialRecord::default();
    }

    // ─── Scoping identifiers ─────────────────────────────────────────────

    /// Tenant id for request scoping: cached profile first, then a
    /// best-effort peek at the access token claims.
    pub fn tenant_id(&self) -> Option<String> {
        let record = self.record.read().unwrap();
        if let Some(tenant) = record.user.as_ref().and_then(|u| u.tenant_id.clone()) {
            return Some(tenant);
        }
        record
            .access_token
            .as_deref()
            .and_then(AccessClaims::decode)
            .and_then(|c| c.tenant_id)
    }

    /// Current user id, with the same profile-then-claims fallback.
    pub fn user_id(&self) -> Option<String> {
        let record = self.record.read().unwrap();
        if let Some(user) = record.user.as_ref() {
            return Some(user.id.clone());
        }
        record
            .access_token
            .as_deref()
            .and_then(AccessClaims::decode)
            .and_then(|c| c.user_id().map(str::to_string))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Snapshot for the host app to persist across reloads.
    pub fn snapshot(&self) -> StoredSession {
        let record = self.record.read().unwrap();
        StoredSession {
            access_token: record.access_token.clone(),
            refresh_token: record.refresh_token.clone(),
            user: record.user.clone(),
            subscription: record.subscription.clone(),
            pending_email: record.pending_email.clone(),
        }
    }

    /// Restore a persisted session wholesale.
    pub fn restore(&self, stored: StoredSession) {
        let mut record = self.record.write().unwrap();
        record.access_token = stored.access_token;
        record.refresh_token = stored.refresh_token;
        record.user = stored.user;
        record.subscription = stored.subscription;
        record.pending_email = stored.pending_email;
    }
}
