// SPDX-License-Identifier: MIT

//! Atrium session core: credentials, authenticated transport, single-flight
//! token refresh, and the adaptive document-indexing poller.
//!
//! The dashboard UI above this crate is plain presentational glue; it calls
//! the typed services exposed by [`Session`] and observes the session-status
//! and document-snapshot watch channels.

pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod refresh;
pub mod services;
pub mod session;
pub mod store;
pub mod transport;

pub use config::Config;
pub use error::{ApiError, Result};
pub use poller::{DocumentPoller, DocumentSnapshot};
pub use refresh::SessionStatus;
pub use session::Session;
pub use store::{CredentialStore, StoredSession};
