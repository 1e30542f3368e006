// SPDX-License-Identifier: MIT

//! Adaptive document poll controller.
//!
//! Watches the document snapshot and keeps a background fetch loop running
//! exactly while any document is still pending or processing. A 429 on any
//! automatic fetch trips a circuit breaker that halts the loop until a
//! manual, user-initiated refresh clears it. Manual fetches always proceed;
//! only the automatic path is suppressed.
//!
//! Snapshots are published on a watch channel only when they structurally
//! differ from the last one, so an unchanged poll produces no downstream
//! notification.

use crate::error::ApiError;
use crate::models::{DocumentRecord, UsageStats};
use crate::services::{ChatService, DocumentService};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Latest mirrored state, published to the UI layer.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    pub documents: Vec<DocumentRecord>,
    pub stats: Option<UsageStats>,
}

struct PollerInner {
    docs: DocumentService,
    chat: ChatService,
    interval: Duration,
    snapshot: Mutex<DocumentSnapshot>,
    running: AtomicBool,
    rate_limited: AtomicBool,
    /// Bumped on every start so a stale loop from a previous run exits
    /// instead of double-polling.
    generation: AtomicU64,
    snapshot_tx: watch::Sender<DocumentSnapshot>,
}

/// Controller driving the document/stats poll loop.
#[derive(Clone)]
pub struct DocumentPoller {
    inner: Arc<PollerInner>,
}

impl DocumentPoller {
    pub fn new(docs: DocumentService, chat: ChatService, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(DocumentSnapshot::default());
        Self {
            inner: Arc::new(PollerInner {
                docs,
                chat,
                interval,
                snapshot: Mutex::new(DocumentSnapshot::default()),
                running: AtomicBool::new(false),
                rate_limited: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                snapshot_tx,
            }),
        }
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<DocumentSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.inner.rate_limited.load(Ordering::SeqCst)
    }

    /// Last-known document list.
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.inner.snapshot.lock().unwrap().documents.clone()
    }

    // ─── Entry points ────────────────────────────────────────────────────

    /// Manual, user-initiated fetch.
    ///
    /// Clears the rate-limit breaker before fetching, always proceeds
    /// regardless of breaker or running state, and surfaces errors to the
    /// caller. A 429 here re-trips the breaker and is surfaced as a
    /// rate-limit message.
    pub async fn user_refresh(&self) -> Result<Vec<DocumentRecord>, ApiError> {
        self.inner.rate_limited.store(false, Ordering::SeqCst);

        let documents = match self.inner.docs.list().await {
            Ok(documents) => documents,
            Err(err) => {
                if err.is_rate_limited() {
                    self.trip_breaker("documents");
                }
                self.evaluate();
                return Err(err);
            }
        };
        self.apply_documents(documents.clone());

        // Stats ride along; a failure here never fails the manual refresh.
        match self.inner.chat.stats().await {
            Ok(stats) => self.apply_stats(stats),
            Err(err) if err.is_rate_limited() => self.trip_breaker("stats"),
            Err(err) => tracing::warn!(error = %err, "Failed to fetch stats"),
        }

        self.evaluate();
        Ok(documents)
    }

    /// One automatic poll iteration: documents then stats.
    ///
    /// Suppressed entirely while the breaker is set. Errors are absorbed:
    /// a 429 trips the breaker, anything else is logged and the next tick
    /// tries again.
    pub async fn poll_tick(&self) {
        if self.is_rate_limited() {
            return;
        }

        match self.inner.docs.list().await {
            Ok(documents) => self.apply_documents(documents),
            Err(err) if err.is_rate_limited() => self.trip_breaker("documents"),
            Err(err) => tracing::warn!(error = %err, "Document poll failed"),
        }

        if !self.is_rate_limited() {
            match self.inner.chat.stats().await {
                Ok(stats) => self.apply_stats(stats),
                Err(err) if err.is_rate_limited() => self.trip_breaker("stats"),
                Err(err) => tracing::warn!(error = %err, "Stats poll failed"),
            }
        }

        self.evaluate();
    }

    /// Stop the automatic loop (e.g. when the owning view unmounts).
    /// Idempotent; an in-flight fetch completes and its result still lands.
    pub fn stop(&self) {
        if self.inner.running.swap(false, Ordering::SeqCst) {
            tracing::debug!("Document polling stopped");
        }
    }

    // ─── Internal evaluation ─────────────────────────────────────────────

    /// Enforce the controller invariant: running iff any document is still
    /// pending/processing, with the breaker overriding everything.
    fn evaluate(&self) {
        let has_active = {
            let snapshot = self.inner.snapshot.lock().unwrap();
            snapshot
                .documents
                .iter()
                .any(|d| d.indexing_status.is_active())
        };

        if self.is_rate_limited() || !has_active {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Spawn the interval loop if it is not already running.
    fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(
            interval_secs = self.inner.interval.as_secs(),
            "Document polling started"
        );

        let poller = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(poller.inner.interval).await;

                let stale = poller.inner.generation.load(Ordering::SeqCst) != generation;
                if stale || !poller.inner.running.load(Ordering::SeqCst) {
                    break;
                }
                poller.poll_tick().await;
            }
        });
    }

    fn trip_breaker(&self, which: &str) {
        tracing::warn!(fetch = which, "Rate limited, pausing document polling");
        self.inner.rate_limited.store(true, Ordering::SeqCst);
        self.stop();
    }

    /// Replace the document list if it structurally changed.
    fn apply_documents(&self, documents: Vec<DocumentRecord>) {
        let mut snapshot = self.inner.snapshot.lock().unwrap();
        if snapshot.documents == documents {
            return;
        }
        snapshot.documents = documents;
        self.inner.snapshot_tx.send_replace(snapshot.clone());
    }

    /// Replace the stats blob if it structurally changed.
    fn apply_stats(&self, stats: UsageStats) {
        let mut snapshot = self.inner.snapshot.lock().unwrap();
        if snapshot.stats.as_ref() == Some(&stats) {
            return;
        }
        snapshot.stats = Some(stats);
        self.inner.snapshot_tx.send_replace(snapshot.clone());
    }
}
