// SPDX-License-Identifier: MIT

//! Typed wrappers over the backend connections.

pub mod chat;
pub mod documents;
pub mod identity;

pub use chat::ChatService;
pub use documents::DocumentService;
pub use identity::IdentityService;
