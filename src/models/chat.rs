//! Conversational service models.

use serde::{Deserialize, Serialize};

/// Reply to a chat query.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default, alias = "answer", alias = "response")]
    pub message: Option<String>,
}

/// Conversation summary from the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One message within a conversation's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Usage statistics reported by the conversational service.
///
/// Kept opaque: the session layer diffs it for the poller but never
/// interprets individual fields.
pub type UsageStats = serde_json::Value;
