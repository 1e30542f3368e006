// SPDX-License-Identifier: MIT

//! Session composition root.
//!
//! Explicitly constructed and dependency-injected: one credential store,
//! one refresh coordinator, three connections sharing the same auth
//! attachment, and the document poller on top. No module-level state; the
//! host application owns the lifecycle.

use crate::config::Config;
use crate::poller::DocumentPoller;
use crate::refresh::{DefaultBearer, RefreshCoordinator, SessionStatus};
use crate::services::{ChatService, DocumentService, IdentityService};
use crate::store::{CredentialStore, StoredSession};
use crate::transport::Connection;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// The session/transport core. Everything above it (rendering, routing,
/// billing UI) talks to this object and its watch channels only.
pub struct Session {
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    identity: IdentityService,
    chat: ChatService,
    documents: DocumentService,
    poller: DocumentPoller,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();
        let store = Arc::new(CredentialStore::new());
        let default_bearer: DefaultBearer = Arc::new(RwLock::new(None));

        let coordinator = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &config.identity_base_url,
            config.refresh_timeout,
            store.clone(),
            default_bearer.clone(),
        ));

        let connect = |name: &'static str, base_url: &str| {
            Connection::new(
                name,
                base_url.to_string(),
                http.clone(),
                store.clone(),
                coordinator.clone(),
                default_bearer.clone(),
            )
        };

        let identity_conn = connect("identity", &config.identity_base_url);
        let chat_conn = connect("chat", &config.chat_base_url);
        let docs_conn = connect("docs", &config.docs_base_url);

        let identity = IdentityService::new(identity_conn, store.clone());
        let chat = ChatService::new(chat_conn, store.clone());
        let documents = DocumentService::new(docs_conn);
        let poller = DocumentPoller::new(documents.clone(), chat.clone(), config.poll_interval);

        Self {
            store,
            coordinator,
            identity,
            chat,
            documents,
            poller,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    pub fn poller(&self) -> &DocumentPoller {
        &self.poller
    }

    /// Session status channel; flips to `Ended` on terminal refresh failure.
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.coordinator.subscribe()
    }

    /// Persistable snapshot of the credential state.
    pub fn snapshot(&self) -> StoredSession {
        self.store.snapshot()
    }

    /// Restore a previously persisted session (page-reload path).
    pub fn restore(&self, stored: StoredSession) {
        self.store.restore(stored);
    }
}
