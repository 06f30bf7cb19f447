//! The conversation store: chat state, persistence and backend calls.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::backend::ChatBackend;
use super::persist::{LocalStore, PersistedState};
use super::types::{session_key, ChatId, Message, Role};

/// First user messages of this length or more are truncated in titles.
const TITLE_FULL_LIMIT: usize = 15;
/// Characters kept when a title is truncated.
const TITLE_TRUNCATED_LEN: usize = 12;

/// Owns all chat state. The view performs every mutation through the
/// operations below and reads state back through the accessors; each
/// operation persists the new state before returning.
///
/// A chat id becomes "materialized" (gains a message list and an entry in
/// the chat id list) on its first send; `new_chat` only retargets the
/// active id.
pub struct ConversationStore<B> {
    backend: B,
    persist: LocalStore,
    session: String,
    messages: BTreeMap<ChatId, Vec<Message>>,
    chat_ids: Vec<ChatId>,
    current_chat_id: ChatId,
    next_chat_id: ChatId,
    last_error: Option<String>,
}

impl<B: ChatBackend> ConversationStore<B> {
    /// Load persisted state and stamp a fresh session identifier
    /// (milliseconds since the Unix epoch, as the web client did).
    #[must_use]
    pub fn new(backend: B, persist: LocalStore) -> Self {
        let session = chrono::Utc::now().timestamp_millis().to_string();
        Self::with_session(backend, persist, session)
    }

    /// Load persisted state under an explicit session stamp.
    #[must_use]
    pub fn with_session(backend: B, persist: LocalStore, session: String) -> Self {
        let state = persist.load();
        Self {
            backend,
            persist,
            session,
            messages: state.messages,
            chat_ids: state.chat_ids,
            current_chat_id: state.current_chat_id,
            next_chat_id: state.next_chat_id,
            last_error: None,
        }
    }

    /// Append `text` as a user message on the active chat and request an
    /// assistant reply. On backend failure the user message stays appended
    /// and the error is recorded for display; retrying the send recovers.
    pub fn send(&mut self, text: &str) {
        self.last_error = None;

        let chat_id = self.current_chat_id;
        self.materialize(chat_id);
        self.push_message(chat_id, Message::user(text));

        let key = session_key(&self.session, chat_id);
        match self.backend.send_message(text, &key) {
            Ok(reply) => {
                debug!("Received {} bytes for chat {chat_id}", reply.len());
                self.push_message(chat_id, Message::assistant(reply));
            }
            Err(err) => {
                self.last_error = Some(format!("Error: {err}"));
            }
        }

        self.persist();
    }

    /// Retarget the active chat to a fresh id. The chat materializes on
    /// its first send.
    pub fn new_chat(&mut self) {
        self.last_error = None;
        self.current_chat_id = self.allocate_chat_id();
        info!("New chat {}", self.current_chat_id);
        self.persist();
    }

    /// Make `id` the active chat.
    pub fn switch_chat(&mut self, id: ChatId) {
        self.last_error = None;
        self.current_chat_id = id;
        debug!("Switched to chat {id}");
        self.persist();
    }

    /// Delete a chat locally and on the backend. The remote delete runs
    /// first; if it fails, local state is left untouched and the error is
    /// recorded. Deleting the active chat switches to the most recent
    /// remaining chat, or allocates a fresh id when none remain.
    pub fn delete_chat(&mut self, id: ChatId) {
        let key = session_key(&self.session, id);
        if let Err(err) = self.backend.delete_chat(&key) {
            self.last_error = Some(format!("Error deleting chat: {err}"));
            return;
        }

        self.messages.remove(&id);
        self.chat_ids.retain(|&chat| chat != id);

        if self.current_chat_id == id {
            self.current_chat_id = match self.chat_ids.last() {
                Some(&most_recent) => most_recent,
                None => self.allocate_chat_id(),
            };
        }

        info!("Deleted chat {id}");
        self.persist();
    }

    /// Active chat id.
    #[must_use]
    pub const fn current_chat_id(&self) -> ChatId {
        self.current_chat_id
    }

    /// Most recent user-visible error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Messages of the active chat. Empty while the chat has not
    /// materialized.
    #[must_use]
    pub fn current_messages(&self) -> &[Message] {
        self.messages
            .get(&self.current_chat_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Materialized chat ids, most recent first.
    #[must_use]
    pub fn recent_chat_ids(&self) -> Vec<ChatId> {
        self.chat_ids.iter().rev().copied().collect()
    }

    /// Short label for a chat: its first user message, whole when shorter
    /// than the title limit, otherwise truncated with an ellipsis. Chats
    /// without a user message label as `Chat {id}`.
    #[must_use]
    pub fn chat_title(&self, id: ChatId) -> String {
        let first_user = self
            .messages
            .get(&id)
            .and_then(|msgs| msgs.iter().find(|msg| msg.role == Role::User));

        match first_user {
            Some(msg) => {
                let trimmed = msg.content.trim();
                if trimmed.chars().count() >= TITLE_FULL_LIMIT {
                    let head: String = trimmed.chars().take(TITLE_TRUNCATED_LEN).collect();
                    format!("{head}...")
                } else {
                    trimmed.to_string()
                }
            }
            None => format!("Chat {id}"),
        }
    }

    fn allocate_chat_id(&mut self) -> ChatId {
        let id = self.next_chat_id;
        self.next_chat_id += 1;
        id
    }

    fn materialize(&mut self, id: ChatId) {
        self.messages.entry(id).or_default();
        if !self.chat_ids.contains(&id) {
            self.chat_ids.push(id);
        }
        // Keep the allocator ahead of every materialized id, so the
        // default chat 1 can never be handed out a second time.
        self.next_chat_id = self.next_chat_id.max(id + 1);
    }

    fn push_message(&mut self, id: ChatId, message: Message) {
        self.messages.entry(id).or_default().push(message);
    }

    /// Mirror the full state to local storage. Persistence failures are
    /// logged and do not interrupt the operation that caused them.
    fn persist(&self) {
        let snapshot = PersistedState {
            messages: self.messages.clone(),
            chat_ids: self.chat_ids.clone(),
            current_chat_id: self.current_chat_id,
            next_chat_id: self.next_chat_id,
        };
        if let Err(err) = self.persist.save(&snapshot) {
            tracing::warn!("Failed to persist chat state: {err}");
        }
    }
}
