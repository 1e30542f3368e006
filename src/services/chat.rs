// SPDX-License-Identifier: MIT

//! Conversational service: queries, conversations, feedback, stats.

use crate::error::ApiError;
use crate::models::{ChatMessage, ChatReply, Conversation, UsageStats};
use crate::store::CredentialStore;
use crate::transport::Connection;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;

/// Client for the conversational backend.
#[derive(Clone)]
pub struct ChatService {
    conn: Connection,
    store: Arc<CredentialStore>,
}

impl ChatService {
    pub fn new(conn: Connection, store: Arc<CredentialStore>) -> Self {
        Self { conn, store }
    }

    /// Send a chat message.
    ///
    /// Tenant and user ids ride in the body as well as the headers so the
    /// backend can scope the query even when header parsing falls over.
    pub async fn send_message(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply, ApiError> {
        let mut body = json!({
            "message": message,
            "conversation_id": conversation_id,
        });
        if let Some(tenant_id) = self.store.tenant_id() {
            body["tenant_id"] = Value::String(tenant_id);
        }
        if let Some(user_id) = self.store.user_id() {
            body["user_id"] = Value::String(user_id);
        }

        self.conn.request_json(Method::POST, "/query/", Some(body)).await
    }

    // ─── Conversations ───────────────────────────────────────────────────

    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.conn.get_json("/conversations/").await
    }

    pub async fn create_conversation(
        &self,
        title: Option<&str>,
    ) -> Result<Conversation, ApiError> {
        self.conn
            .request_json(Method::POST, "/conversations/", Some(json!({ "title": title })))
            .await
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError> {
        self.conn
            .request_empty(
                Method::DELETE,
                &format!("/conversations/{}/", conversation_id),
                None,
            )
            .await
    }

    pub async fn history(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let conversation_id = conversation_id.to_string();
        let response = self
            .conn
            .execute(move |http, base| {
                http.get(format!("{}/messages/", base))
                    .query(&[("conversation_id", conversation_id.as_str())])
            })
            .await?;
        Connection::parse_json(response).await
    }

    // ─── Feedback ────────────────────────────────────────────────────────

    pub async fn submit_feedback(
        &self,
        message_id: &str,
        feedback: &str,
        comment: &str,
    ) -> Result<(), ApiError> {
        self.conn
            .request_empty(
                Method::POST,
                &format!("/messages/{}/feedback/", message_id),
                Some(json!({ "feedback": feedback, "comment": comment })),
            )
            .await
    }

    // ─── Stats & health ──────────────────────────────────────────────────

    /// Usage statistics, tenant-scoped by query param alongside the header.
    pub async fn stats(&self) -> Result<UsageStats, ApiError> {
        let tenant_id = self.store.tenant_id();
        let response = self
            .conn
            .execute(move |http, base| {
                let mut builder = http.get(format!("{}/stats/", base));
                if let Some(tenant_id) = &tenant_id {
                    builder = builder.query(&[("tenant_id", tenant_id.as_str())]);
                }
                builder
            })
            .await?;
        Connection::parse_json(response).await
    }

    pub async fn health(&self) -> Result<(), ApiError> {
        self.conn.request_empty(Method::GET, "/health/", None).await
    }
}
