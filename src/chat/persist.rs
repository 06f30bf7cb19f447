//! Local persistence for chat state, one JSON file per key.
//!
//! The layout mirrors the browser storage the web client used: four
//! JSON-encoded keys named `messages`, `chatIds`, `currentChatId` and
//! `nextChatId`. Missing or corrupt keys degrade to defaults so a bad
//! state directory can never prevent startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::error::ChatError;
use super::types::{ChatId, Message};

const KEY_MESSAGES: &str = "messages";
const KEY_CHAT_IDS: &str = "chatIds";
const KEY_CURRENT_CHAT_ID: &str = "currentChatId";
const KEY_NEXT_CHAT_ID: &str = "nextChatId";

/// Snapshot of everything the store persists.
#[derive(Clone, Debug)]
pub struct PersistedState {
    /// Message history per chat.
    pub messages: BTreeMap<ChatId, Vec<Message>>,
    /// Materialized chat ids, in creation order.
    pub chat_ids: Vec<ChatId>,
    /// Active chat id.
    pub current_chat_id: ChatId,
    /// Next chat id to allocate.
    pub next_chat_id: ChatId,
}

/// Directory-backed key-value store of JSON-encoded values.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open the store, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ChatError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Load persisted state, applying defaults for missing keys.
    ///
    /// A missing `nextChatId` is recomputed as `max(chatIds) + 1` (or 1
    /// when no chat exists), so histories written before that key was
    /// introduced keep allocating unique ids.
    #[must_use]
    pub fn load(&self) -> PersistedState {
        let messages = self.read_key(KEY_MESSAGES).unwrap_or_default();
        let chat_ids: Vec<ChatId> = self.read_key(KEY_CHAT_IDS).unwrap_or_default();
        let current_chat_id = self.read_key(KEY_CURRENT_CHAT_ID).unwrap_or(1);
        let next_chat_id = self
            .read_key(KEY_NEXT_CHAT_ID)
            .unwrap_or_else(|| chat_ids.iter().max().map_or(1, |max| max + 1));

        PersistedState {
            messages,
            chat_ids,
            current_chat_id,
            next_chat_id,
        }
    }

    /// Write all four keys back to disk.
    ///
    /// # Errors
    /// Returns an error if any key cannot be encoded or written.
    pub fn save(&self, state: &PersistedState) -> Result<(), ChatError> {
        self.write_key(KEY_MESSAGES, &state.messages)?;
        self.write_key(KEY_CHAT_IDS, &state.chat_ids)?;
        self.write_key(KEY_CURRENT_CHAT_ID, &state.current_chat_id)?;
        self.write_key(KEY_NEXT_CHAT_ID, &state.next_chat_id)?;
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = fs::read_to_string(self.key_path(key)).ok()?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring corrupt persisted key {key}: {err}");
                None
            }
        }
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ChatError> {
        let text = serde_json::to_string(value)?;
        fs::write(self.key_path(key), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample_state() -> PersistedState {
        let mut messages = BTreeMap::new();
        messages.insert(
            1,
            vec![
                Message::user("what is a balance sheet?"),
                Message::assistant("A snapshot of assets and liabilities."),
            ],
        );
        PersistedState {
            messages,
            chat_ids: vec![1],
            current_chat_id: 1,
            next_chat_id: 2,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();

        store.save(&sample_state()).unwrap();
        let loaded = store.load();

        assert_eq!(loaded.chat_ids, vec![1]);
        assert_eq!(loaded.current_chat_id, 1);
        assert_eq!(loaded.next_chat_id, 2);
        assert_eq!(loaded.messages[&1].len(), 2);
        assert_eq!(loaded.messages[&1][0].content, "what is a balance sheet?");
    }

    #[test]
    fn test_empty_directory_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();

        let loaded = store.load();
        assert!(loaded.messages.is_empty());
        assert!(loaded.chat_ids.is_empty());
        assert_eq!(loaded.current_chat_id, 1);
        assert_eq!(loaded.next_chat_id, 1);
    }

    #[test]
    fn test_missing_next_chat_id_recomputed_from_chat_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();

        store.save(&sample_state()).unwrap();
        fs::remove_file(dir.path().join("nextChatId.json")).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.next_chat_id, 2);
    }

    #[test]
    fn test_corrupt_key_degrades_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();

        store.save(&sample_state()).unwrap();
        fs::write(dir.path().join("messages.json"), "{not json").unwrap();

        let loaded = store.load();
        assert!(loaded.messages.is_empty());
        assert_eq!(loaded.chat_ids, vec![1]);
    }

    #[test]
    fn test_key_file_names_match_web_client() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        store.save(&sample_state()).unwrap();

        for key in ["messages", "chatIds", "currentChatId", "nextChatId"] {
            assert!(dir.path().join(format!("{key}.json")).exists(), "{key}");
        }
    }
}
