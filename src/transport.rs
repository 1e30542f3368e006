// SPDX-License-Identifier: MIT

//! Backend connections and the shared auth attachment.
//!
//! Three logical connections (identity, chat, documents) share one
//! `reqwest::Client`, one credential store, and one refresh coordinator.
//! Auth attachment is a single method applied on every send, never
//! duplicated per connection: bearer token (read through the store on each
//! request) plus the tenant-scoping header.
//!
//! Requests are built by a closure so the post-refresh replay can reissue
//! the original request exactly once with the fresh token attached.

use crate::error::ApiError;
use crate::refresh::{DefaultBearer, RefreshCoordinator};
use crate::store::CredentialStore;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Tenant-scoping header sent on every request to every backend.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// One logical backend connection.
#[derive(Clone)]
pub struct Connection {
    name: &'static str,
    base_url: String,
    http: reqwest::Client,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    default_bearer: DefaultBearer,
}

impl Connection {
    pub fn new(
        name: &'static str,
        base_url: String,
        http: reqwest::Client,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
        default_bearer: DefaultBearer,
    ) -> Self {
        Self {
            name,
            base_url,
            http,
            store,
            coordinator,
            default_bearer,
        }
    }

    /// Absolute URL for a path on this connection.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The one reusable auth attachment, applied identically on all three
    /// connections: bearer credential when present, tenant header when known.
    fn attach_auth(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let mut builder = builder;
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant_id) = self.store.tenant_id() {
            builder = builder.header(TENANT_HEADER, tenant_id);
        }
        builder
    }

    /// Send a request, absorbing a first 401 into the refresh-and-replay
    /// cycle. The builder closure is invoked once per attempt so the replay
    /// reissues the original request with current credentials.
    pub async fn execute<F>(&self, build: F) -> Result<reqwest::Response, ApiError>
    where
        F: Fn(&reqwest::Client, &str) -> RequestBuilder,
    {
        let (response, sent_token) = self.send_once(&build).await?;
        if response.status().as_u16() != 401 {
            return Self::check(response).await;
        }

        // First 401 on this request: hand the coordinator the token this
        // attempt actually carried, so a refresh that completed while the
        // response was in flight is reused instead of repeated. A terminal
        // refresh (AuthTerminal) propagates and the store is already
        // cleared by the coordinator.
        tracing::debug!(connection = self.name, "401 received, entering refresh path");
        self.coordinator
            .refresh_access_token(sent_token.as_deref())
            .await?;

        // Replay once with the refreshed credential. A second 401 is
        // surfaced as-is; the retry flag exists to prevent loops.
        let (response, _) = self.send_once(&build).await?;
        Self::check(response).await
    }

    /// Build, attach auth, and send, returning the bearer token the attempt
    /// carried. A missing response (transport error) never enters the
    /// refresh path.
    async fn send_once<F>(&self, build: &F) -> Result<(reqwest::Response, Option<String>), ApiError>
    where
        F: Fn(&reqwest::Client, &str) -> RequestBuilder,
    {
        let token = self
            .store
            .access_token()
            .or_else(|| self.default_bearer.read().unwrap().clone());
        let builder = self.attach_auth(build(&self.http, &self.base_url), token.as_deref());
        let response = builder.send().await.map_err(|err| {
            tracing::warn!(connection = self.name, error = %err, "Network error");
            ApiError::Network(err)
        })?;
        Ok((response, token))
    }

    /// Classify a non-success response into the error taxonomy.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            tracing::warn!("Rate limit hit (429)");
        }
        Err(ApiError::from_response(status.as_u16(), &body))
    }

    // ─── Convenience wrappers ────────────────────────────────────────────

    /// JSON-in/JSON-out request.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let path = path.to_string();
        let response = self
            .execute(move |http, base| {
                let mut builder = http.request(method.clone(), format!("{}{}", base, path));
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                builder
            })
            .await?;

        Self::parse_json(response).await
    }

    /// JSON request where the response body is ignored.
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        let path = path.to_string();
        self.execute(move |http, base| {
            let mut builder = http.request(method.clone(), format!("{}{}", base, path));
            if let Some(body) = &body {
                builder = builder.json(body);
            }
            builder
        })
        .await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request_json(Method::GET, path, None).await
    }

    /// Decode a success body, mapping decode failures to `Internal`.
    pub async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|err| ApiError::Internal(anyhow::anyhow!("JSON parse error: {}", err)))
    }
}
