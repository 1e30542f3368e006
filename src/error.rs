// SPDX-License-Identifier: MIT

//! Transport error taxonomy and response-body message extraction.
//!
//! Every failure surfaced by this crate is an [`ApiError`]. The variants map
//! directly onto the status-code classes the backends emit:
//!
//! - no response at all → [`ApiError::Network`]
//! - 401 → [`ApiError::AuthExpired`] (absorbed by the refresh coordinator)
//! - refresh itself failed → [`ApiError::AuthTerminal`] (forces logout)
//! - 429 → [`ApiError::RateLimited`]
//! - 5xx → [`ApiError::Server`]
//! - other 4xx → [`ApiError::Validation`] with a best-effort message pulled
//!   out of the JSON body

use serde_json::Value;
use std::collections::BTreeMap;

/// Error type for all session/transport operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error. Please check your connection.")]
    Network(#[source] reqwest::Error),

    #[error("Authentication expired")]
    AuthExpired,

    #[error("Session ended. Please sign in again.")]
    AuthTerminal,

    #[error("Too many requests. Please slow down and try again.")]
    RateLimited,

    #[error("Oops! Something went wrong on our server. Please try again later.")]
    Server { status: u16, message: String },

    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        /// Per-field error map when the body carried one.
        fields: Option<BTreeMap<String, Vec<String>>>,
    },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Classify a non-success response from its status code and raw body.
    ///
    /// 401 is classified as `AuthExpired` here; the transport layer decides
    /// whether that turns into a refresh, a replay, or `AuthTerminal`.
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => ApiError::AuthExpired,
            429 => ApiError::RateLimited,
            s if s >= 500 => ApiError::Server {
                status: s,
                message: extract_message(body).unwrap_or_else(|| format!("HTTP {}", s)),
            },
            s => {
                let parsed: Option<Value> = serde_json::from_str(body).ok();
                let fields = parsed.as_ref().and_then(field_errors);
                let message = parsed
                    .as_ref()
                    .and_then(error_message)
                    .unwrap_or_else(|| "An error occurred".to_string());
                ApiError::Validation {
                    status: s,
                    message,
                    fields,
                }
            }
        }
    }

    /// True for the recoverable 401 case.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }

    /// True for 429 responses (the poll breaker trigger).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }
}

/// Extract a human-readable message from a raw JSON error body.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(error_message)
}

/// Best-effort message extraction from a parsed error body.
///
/// Checks, in order: a plain string body, `detail`, `error`, `message`, then
/// the first entry of a per-field error map (skipping a `success` flag).
pub fn error_message(data: &Value) -> Option<String> {
    if let Some(s) = data.as_str() {
        return Some(s.to_string());
    }

    let obj = data.as_object()?;

    for key in ["detail", "error", "message"] {
        if let Some(msg) = obj.get(key).and_then(Value::as_str) {
            return Some(msg.to_string());
        }
    }

    // Per-field error map: join every field as "Field: messages"
    if let Some(fields) = field_errors(data) {
        if !fields.is_empty() {
            let lines: Vec<String> = fields
                .iter()
                .map(|(field, msgs)| format!("{}: {}", format_field_name(field), msgs.join(", ")))
                .collect();
            return Some(lines.join("\n"));
        }
    }

    None
}

/// Pull a per-field error map out of an error body, if one is present.
///
/// Accepts both the nested `{"errors": {field: [...]}}` shape and a bare
/// top-level map of field → message(s).
fn field_errors(data: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let obj = data.as_object()?;

    let source = match obj.get("errors").and_then(Value::as_object) {
        Some(nested) => nested,
        None => {
            // A bare field map never carries detail/error/message keys
            if obj.contains_key("detail") || obj.contains_key("error") || obj.contains_key("message")
            {
                return None;
            }
            obj
        }
    };

    let mut fields = BTreeMap::new();
    for (key, value) in source {
        if key == "success" {
            continue;
        }
        let msgs = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => continue,
        };
        if !msgs.is_empty() {
            fields.insert(key.clone(), msgs);
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Humanize a backend field name for display.
fn format_field_name(field: &str) -> String {
    if field == "non_field_errors" {
        return "Error".to_string();
    }
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, ApiError>;
