//! Conversation store port
//!
//! Persistence for conversations and their messages.

use async_trait::async_trait;
use council_domain::{Conversation, ConversationMetadata, Message};
use thiserror::Error;

/// Errors that can occur in a conversation store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Conversation already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Storage of conversations
///
/// Implementations must serialize concurrent writes to the same conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty conversation
    async fn create(&self, id: &str) -> Result<Conversation, StoreError>;

    /// Load a conversation, `None` when unknown
    async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError>;

    /// Metadata of every conversation, newest first
    async fn list(&self) -> Result<Vec<ConversationMetadata>, StoreError>;

    async fn append_message(&self, id: &str, message: Message) -> Result<(), StoreError>;

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError>;
}
