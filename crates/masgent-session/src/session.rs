use chrono::{DateTime, Utc};
use masgent_core::{Message, Role};
use serde::Serialize;
use uuid::Uuid;

/// An in-memory conversation. Turns can only be appended; the whole session is
/// dropped when agent mode is left.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: Uuid,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// An empty transcript with a fresh id.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Unique id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last appended message.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Appends `message`. Messages are never removed.
    pub fn add_message(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Appends a user turn.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content, self.id));
    }

    /// Appends an assistant turn.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content, self.id));
    }

    /// Records a tool turn; `metadata` carries the call id and tool name.
    pub fn add_tool(&mut self, content: impl Into<String>, metadata: &[(&str, serde_json::Value)]) {
        let mut message = Message::tool(content, self.id);
        for (key, value) in metadata {
            message = message.with_metadata(*key, value.clone());
        }
        self.add_message(message);
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The most recent assistant turn, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Number of messages sent as `role`.
    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
