//! JSON-file conversation store
//!
//! One `<id>.json` file per conversation. Writes go through a temporary file
//! and a rename, and are serialized by a single async mutex.

use async_trait::async_trait;
use council_application::{ConversationStore, StoreError};
use council_domain::{Conversation, ConversationMetadata, Message};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// [`ConversationStore`] keeping each conversation in its own JSON file
pub struct JsonConversationStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConversationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn load(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        let path = self.path_for(id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let path = self.path_for(&conversation.id)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let json = serde_json::to_string_pretty(conversation)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;
        debug!("Saved conversation {}", conversation.id);
        Ok(())
    }

    /// Load, modify and save one conversation under the write lock
    async fn update<F>(&self, id: &str, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Conversation) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut conversation = self
            .load(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply(&mut conversation);
        self.save(&conversation).await
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl ConversationStore for JsonConversationStore {
    async fn create(&self, id: &str) -> Result<Conversation, StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.load(id).await?.is_some() {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        let conversation = Conversation::new(id);
        self.save(&conversation).await?;
        Ok(conversation)
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>, StoreError> {
        match self.load(id).await {
            // Invalid ids can never name a stored conversation
            Err(StoreError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    async fn list(&self) -> Result<Vec<ConversationMetadata>, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.dir, e)),
        };

        let mut conversations = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable conversation {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<Conversation>(&content) {
                Ok(conversation) => conversations.push(conversation.metadata()),
                Err(e) => warn!("Skipping malformed conversation {}: {}", path.display(), e),
            }
        }

        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(conversations)
    }

    async fn append_message(&self, id: &str, message: Message) -> Result<(), StoreError> {
        self.update(id, |conversation| conversation.messages.push(message))
            .await
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let title = title.to_string();
        self.update(id, |conversation| conversation.title = title)
            .await
    }
}
