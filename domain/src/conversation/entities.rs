//! Conversation entities

use crate::council::event::Stage2Metadata;
use crate::council::ranking::RankingSubmission;
use crate::council::value_objects::{FinalResponse, ModelResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to conversations before one is generated
pub const DEFAULT_TITLE: &str = "New Conversation";

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        stage1: Vec<ModelResponse>,
        stage2: Vec<RankingSubmission>,
        stage3: FinalResponse,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Stage2Metadata>,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }
}

/// A stored conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// True before the first user message has been stored
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn metadata(&self) -> ConversationMetadata {
        ConversationMetadata {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// List-view summary of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub message_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Model;

    #[test]
    fn test_new_conversation_defaults() {
        let conversation = Conversation::new("abc");
        assert!(conversation.is_empty());
        assert_eq!(conversation.title, DEFAULT_TITLE);
        assert_eq!(conversation.metadata().message_count, 0);
    }

    #[test]
    fn test_message_role_tag() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));

        let assistant = Message::Assistant {
            stage1: vec![],
            stage2: vec![],
            stage3: FinalResponse::new(Model::Gemini3Pro, "answer"),
            metadata: None,
        };
        let json = serde_json::to_value(&assistant).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["stage3"]["response"], "answer");
        assert!(json.get("metadata").is_none());
    }
}
