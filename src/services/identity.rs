// SPDX-License-Identifier: MIT

//! Identity service: authentication, profile, and the subscription cache.

use crate::error::ApiError;
use crate::models::{SubscriptionSnapshot, UserProfile};
use crate::store::CredentialStore;
use crate::transport::Connection;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: Option<String>,
    refresh: Option<String>,
    user: Option<UserProfile>,
}

/// Client for the identity backend.
#[derive(Clone)]
pub struct IdentityService {
    conn: Connection,
    store: Arc<CredentialStore>,
}

impl IdentityService {
    pub fn new(conn: Connection, store: Arc<CredentialStore>) -> Self {
        Self { conn, store }
    }

    // ─── Authentication ──────────────────────────────────────────────────

    /// Log in and install the session (token pair + profile together).
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiError> {
        let response: LoginResponse = self
            .conn
            .request_json(
                Method::POST,
                "/auth/login/",
                Some(json!({ "email": email, "password": password })),
            )
            .await?;

        let (access, user) = match (response.access, response.user) {
            (Some(access), Some(user)) => (access, user),
            _ => {
                return Err(ApiError::Internal(anyhow::anyhow!(
                    "Invalid login response from server"
                )))
            }
        };

        self.store
            .set_session(access, response.refresh, user.clone());
        tracing::info!(user = %user.email, "Logged in");
        Ok(user)
    }

    /// Register a new account. Does not mutate the session; the caller
    /// typically records the pending verification email.
    pub async fn signup(&self, payload: Value) -> Result<Value, ApiError> {
        let response: Value = self
            .conn
            .request_json(Method::POST, "/auth/signup/", Some(payload.clone()))
            .await?;

        if let Some(email) = payload.get("email").and_then(Value::as_str) {
            self.store.set_pending_email(email.to_string());
        }
        Ok(response)
    }

    /// Log out: the endpoint call is best-effort, the local clear is not.
    pub async fn logout(&self) {
        if let Err(err) = self
            .conn
            .request_empty(Method::POST, "/auth/logout/", None)
            .await
        {
            tracing::warn!(error = %err, "Logout endpoint failed, clearing session anyway");
        }
        self.store.clear();
    }

    /// Fetch the current profile and replace the stored snapshot wholesale.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let user: UserProfile = self.conn.get_json("/auth/me/").await?;
        self.store.set_user(user.clone());
        Ok(user)
    }

    // ─── Email verification ──────────────────────────────────────────────

    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<Value, ApiError> {
        let response = self
            .conn
            .request_json(
                Method::POST,
                "/auth/verify-email/",
                Some(json!({ "email": email, "otp": otp })),
            )
            .await?;
        self.store.remove_pending_email();
        Ok(response)
    }

    pub async fn resend_verification(&self, email: &str) -> Result<Value, ApiError> {
        self.conn
            .request_json(
                Method::POST,
                "/auth/resend-verification/",
                Some(json!({ "email": email })),
            )
            .await
    }

    // ─── Password management ─────────────────────────────────────────────

    pub async fn request_password_reset(&self, email: &str) -> Result<Value, ApiError> {
        self.conn
            .request_json(
                Method::POST,
                "/auth/request-password-reset/",
                Some(json!({ "email": email.trim().to_lowercase() })),
            )
            .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        self.conn
            .request_json(
                Method::POST,
                "/auth/reset-password/",
                Some(json!({
                    "email": email.trim().to_lowercase(),
                    "token": token,
                    "new_password": new_password,
                })),
            )
            .await
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<Value, ApiError> {
        self.conn
            .request_json(
                Method::POST,
                "/auth/change-password/",
                Some(json!({
                    "old_password": old_password,
                    "new_password": new_password,
                })),
            )
            .await
    }

    // ─── Subscription cache ──────────────────────────────────────────────

    /// Refresh the cached subscription snapshot.
    ///
    /// Never fails: a billing-service outage must not block the app, so any
    /// error caches and returns the inactive defaults instead.
    pub async fn current_subscription(&self) -> SubscriptionSnapshot {
        match self
            .conn
            .get_json::<SubscriptionSnapshot>("/subscription/current/")
            .await
        {
            Ok(snapshot) => {
                self.store.set_subscription(snapshot.clone());
                snapshot
            }
            Err(err) => {
                tracing::warn!(error = %err, "Subscription check failed, caching inactive defaults");
                let fallback = SubscriptionSnapshot::inactive();
                self.store.set_subscription(fallback.clone());
                fallback
            }
        }
    }
}
