//! Document records mirrored from the document service.
//!
//! The server is authoritative; the client only holds the latest snapshot
//! and compares it structurally for change detection.

use serde::{Deserialize, Serialize};

/// Server-side processing state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl IndexingStatus {
    /// True while the server is still working on the document.
    pub fn is_active(self) -> bool {
        matches!(self, IndexingStatus::Pending | IndexingStatus::Processing)
    }
}

/// One document as reported by the document service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub indexing_status: IndexingStatus,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
