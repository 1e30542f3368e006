//! Subscription snapshot cached by the session.
//!
//! The transport layer treats this as an opaque cache: it reads
//! `is_active` for convenience predicates and nothing else. Plan rules
//! live in the layers above.

use serde::{Deserialize, Serialize};

/// Latest known subscription state for the current tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    #[serde(default)]
    pub has_subscription: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub next_billing_date: Option<String>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub user_count: u32,
    #[serde(default)]
    pub storage_limit: Option<u64>,
}

impl SubscriptionSnapshot {
    /// Safe defaults used when the subscription check fails; an inactive
    /// snapshot, never an error, so a billing outage cannot block login.
    pub fn inactive() -> Self {
        Self {
            has_subscription: false,
            is_active: false,
            plan_name: None,
            next_billing_date: None,
            user_limit: None,
            user_count: 0,
            storage_limit: None,
        }
    }
}
