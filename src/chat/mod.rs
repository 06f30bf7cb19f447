//! Conversation management for the caBuddy client.
//!
//! The store owns all chat state (message histories, chat id allocation,
//! the active chat) and performs the backend calls; the view layer only
//! reads state back and re-renders. Every mutation is mirrored to local
//! storage as a side effect.

pub mod backend;
pub mod config;
pub mod error;
pub mod persist;
pub mod store;
pub mod types;

pub use backend::{ChatBackend, HttpChatBackend};
pub use config::ChatConfig;
pub use error::ChatError;
pub use persist::LocalStore;
pub use store::ConversationStore;
pub use types::{ChatId, Message, Role};
