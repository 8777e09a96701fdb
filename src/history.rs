//! Chat message types and per-user history persistence
//!
//! The store is an injected interface so the hosting process decides where
//! transcripts live; the default implementation keeps one JSON file per user.

use crate::error::RagError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Persistence seam for chat transcripts
pub trait HistoryStore: Send + Sync {
    fn load(&self, user: &str) -> Result<Vec<ChatMessage>, RagError>;
    fn save(&self, user: &str, history: &[ChatMessage]) -> Result<(), RagError>;
}

#[derive(Serialize, Deserialize)]
struct PersistedHistory {
    saved_at: String,
    messages: Vec<ChatMessage>,
}

/// History store writing `<dir>/<user>_chat_history.json`
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, user: &str) -> PathBuf {
        self.dir
            .join(format!("{}_chat_history.json", sanitize_user(user)))
    }
}

impl HistoryStore for JsonHistoryStore {
    /// A missing file is an empty history, not an error
    fn load(&self, user: &str) -> Result<Vec<ChatMessage>, RagError> {
        let path = self.path_for(user);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        let persisted: PersistedHistory = serde_json::from_str(&data)
            .map_err(|e| RagError::other(format!("Corrupt history file {}: {}", path.display(), e)))?;
        Ok(persisted.messages)
    }

    fn save(&self, user: &str, history: &[ChatMessage]) -> Result<(), RagError> {
        std::fs::create_dir_all(&self.dir)?;
        let persisted = PersistedHistory {
            saved_at: chrono::Utc::now().to_rfc3339(),
            messages: history.to_vec(),
        };
        let data = serde_json::to_string_pretty(&persisted)
            .map_err(|e| RagError::other(format!("Failed to serialize history: {}", e)))?;
        std::fs::write(self.path_for(user), data)?;
        Ok(())
    }
}

/// Keep usernames filesystem-safe
fn sanitize_user(user: &str) -> String {
    let cleaned: String = user
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}
