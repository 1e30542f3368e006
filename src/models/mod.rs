// SPDX-License-Identifier: MIT

//! Wire models shared across the three backend connections.

pub mod chat;
pub mod document;
pub mod subscription;
pub mod user;

pub use chat::{ChatMessage, ChatReply, Conversation, UsageStats};
pub use document::{DocumentRecord, IndexingStatus};
pub use subscription::SubscriptionSnapshot;
pub use user::{AccessClaims, Role, UserProfile};
