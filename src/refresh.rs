// SPDX-License-Identifier: MIT

//! Single-flight token refresh coordinator.
//!
//! Turns N concurrent "authentication expired" failures into exactly one
//! refresh call. The state machine has two states, `Idle` and `Refreshing`;
//! while a refresh is in flight every further caller parks on a oneshot in
//! an arrival-ordered queue and is resolved when the leader finishes.
//!
//! A failed refresh is terminal: the credential store is cleared wholesale
//! and `SessionStatus::Ended` is published so the UI layer can redirect to
//! an unauthenticated view. No further retry is attempted.

use crate::error::ApiError;
use crate::store::CredentialStore;
use serde::Deserialize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// Whether the session is still usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// Refresh failed terminally; callers should treat the user as logged out.
    Ended,
}

/// Shared default bearer slot, mirrored onto every connection.
///
/// The auth attachment reads the store first and falls back to this slot,
/// so requests built after a refresh pick up the new token even without
/// touching the store.
pub type DefaultBearer = Arc<RwLock<Option<String>>>;

/// Wire response of the refresh endpoint. A 200 without `access` is a
/// failure, not a success.
#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access: Option<String>,
}

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<Result<String, ApiError>>>,
    },
}

/// Single-flight refresh state machine.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    timeout: Duration,
    store: Arc<CredentialStore>,
    default_bearer: DefaultBearer,
    state: Mutex<RefreshState>,
    status_tx: watch::Sender<SessionStatus>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        identity_base_url: &str,
        timeout: Duration,
        store: Arc<CredentialStore>,
        default_bearer: DefaultBearer,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Active);
        Self {
            http,
            refresh_url: format!("{}/auth/token/refresh/", identity_base_url),
            timeout,
            store,
            default_bearer,
            state: Mutex::new(RefreshState::Idle),
            status_tx,
        }
    }

    /// Subscribe to session status changes (the forced-logout signal).
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Obtain a fresh access token, coalescing concurrent callers.
    ///
    /// `stale_token` is the credential that was attached to the request
    /// whose 401 brought the caller here. If the store already holds a
    /// different token, an earlier cycle has completed in the meantime and
    /// that token is returned without another refresh; a 401 observed with
    /// yesterday's credential is not evidence against today's.
    ///
    /// Otherwise the first caller in `Idle` becomes the leader and performs
    /// the refresh; everyone arriving while `Refreshing` waits for the
    /// leader's outcome. Exactly one refresh request is in flight at any
    /// time.
    pub async fn refresh_access_token(&self, stale_token: Option<&str>) -> Result<String, ApiError> {
        let waiter = {
            let mut state = self.state.lock().unwrap();

            // A completed cycle writes the store before returning to Idle,
            // so under this lock a store/stale mismatch proves a refresh
            // already happened for this 401.
            if let Some(current) = self.store.access_token() {
                if stale_token != Some(current.as_str()) {
                    tracing::debug!("Token already refreshed by another caller, reusing it");
                    return Ok(current);
                }
            }

            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            return match rx.await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Internal(anyhow::anyhow!(
                    "refresh leader dropped without resolving waiters"
                ))),
            };
        }

        // Leader path: the lock is not held across the network call.
        let outcome = self.perform_refresh().await;

        // Store and bearer slot are settled before the state flips back to
        // Idle, so a late 401 handler taking the lock sees the new token.
        match &outcome {
            Ok(access) => {
                self.store.set_access_token(access.clone());
                *self.default_bearer.write().unwrap() = Some(access.clone());
            }
            Err(_) => {
                self.store.clear();
                *self.default_bearer.write().unwrap() = None;
                self.status_tx.send_replace(SessionStatus::Ended);
            }
        }

        let waiters = {
            let mut state = self.state.lock().unwrap();
            match std::mem::replace(&mut *state, RefreshState::Idle) {
                RefreshState::Refreshing { waiters } => waiters,
                RefreshState::Idle => Vec::new(),
            }
        };

        match outcome {
            Ok(access) => {
                tracing::info!(waiters = waiters.len(), "Access token refreshed");

                // FIFO arrival order; each waiter reissues its request once.
                for tx in waiters {
                    let _ = tx.send(Ok(access.clone()));
                }
                Ok(access)
            }
            Err(err) => {
                tracing::warn!(error = %err, waiters = waiters.len(), "Token refresh failed, ending session");
                for tx in waiters {
                    let _ = tx.send(Err(ApiError::AuthTerminal));
                }
                Err(ApiError::AuthTerminal)
            }
        }
    }

    /// One refresh round trip, bounded end to end by the configured timeout.
    ///
    /// Any failure here is terminal for the session: no refresh token,
    /// network error, non-2xx, missing `access` field, or timeout.
    async fn perform_refresh(&self) -> Result<String, ApiError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(ApiError::AuthTerminal)?;

        let round_trip = async {
            let response = self
                .http
                .post(&self.refresh_url)
                .json(&serde_json::json!({ "refresh": refresh_token }))
                .send()
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, "Refresh request failed to send");
                    ApiError::AuthTerminal
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = %status, body = %body, "Refresh endpoint rejected the token");
                return Err(ApiError::AuthTerminal);
            }

            let parsed: TokenRefreshResponse = response
                .json()
                .await
                .map_err(|_| ApiError::AuthTerminal)?;

            parsed.access.ok_or(ApiError::AuthTerminal)
        };

        match tokio::time::timeout(self.timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Refresh round trip timed out");
                Err(ApiError::AuthTerminal)
            }
        }
    }
}
