//! Core types and error definitions for Masgent.
//!
//! This crate provides the foundational types shared across all Masgent crates,
//! including error handling, transcript messages, tool call abstractions and the
//! credential model.
//!
//! # Main types
//!
//! - [`MasgentError`]: Unified error enum for all Masgent subsystems.
//! - [`MasgentResult`]: Convenience alias for `Result<T, MasgentError>`.
//! - [`Role`]: Transcript role (user, assistant, system, tool).
//! - [`Message`]: A single turn within a conversation session.
//! - [`ToolCall`]: A model-initiated tool invocation request.
//! - [`ToolResult`]: The outcome of dispatching a tool.
//! - [`Credentials`]: API keys resolved once at startup.

/// Credential model and pluggable credential sources.
pub mod credentials;

pub use credentials::{
    CredentialKind, CredentialResolver, CredentialSource, CredentialStore, Credentials,
    EnvCredentialSource, StaticCredentialSource,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

// --- Error types ---

/// Top-level error type for Masgent.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum MasgentError {
    /// An error originating from the agent session loop.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error from an outbound HTTP request (LLM or materials database).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error related to the conversation session.
    #[error("Session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error raised by a tool handler.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Malformed, unsupported or inconsistent structure data.
    #[error("Structure error: {0}")]
    Structure(String),

    /// The materials database rejected a query or had no match.
    #[error("Database error: {0}")]
    Database(String),

    /// A required credential could not be resolved.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A parameter failed its schema constraint.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`MasgentError`].
pub type MasgentResult<T> = Result<T, MasgentError>;

// --- Message types ---

/// The role of the participant that authored a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human end-user.
    User,
    /// The language model.
    Assistant,
    /// A system-level instruction or prompt.
    System,
    /// A tool invocation or its result.
    Tool,
}

/// A single turn exchanged within a conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The role of the message author.
    pub role: Role,
    /// The textual content of the message.
    pub content: String,
    /// The session this message belongs to.
    pub session_id: Uuid,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary key-value metadata attached to the message.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Message {
    /// Creates a new message with the given role, content, and session ID.
    pub fn new(role: Role, content: impl Into<String>, session_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            session_id,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Creates a new message with [`Role::User`].
    pub fn user(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::User, content, session_id)
    }

    /// Creates a new message with [`Role::Assistant`].
    pub fn assistant(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::Assistant, content, session_id)
    }

    /// Creates a new message with [`Role::Tool`].
    pub fn tool(content: impl Into<String>, session_id: Uuid) -> Self {
        Self::new(Role::Tool, content, session_id)
    }

    /// Attaches a metadata entry and returns the message.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

// --- Tool types ---

/// A request from the language model to invoke a specific tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier assigned by the model for this tool call.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Raw JSON arguments, not yet validated.
    pub arguments: serde_json::Value,
}

/// Whether a tool dispatch succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The handler ran and produced at least part of its output.
    Ok,
    /// Validation or execution failed.
    Error,
}

/// The outcome of dispatching a tool.
///
/// `message` is the only part ever shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Success or failure.
    pub status: ToolStatus,
    /// Human-readable outcome.
    pub message: String,
    /// Paths of every file written, in write order.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
}

impl ToolResult {
    /// Creates a successful tool result.
    pub fn success(message: impl Into<String>, artifacts: Vec<PathBuf>) -> Self {
        Self {
            status: ToolStatus::Ok,
            message: message.into(),
            artifacts,
        }
    }

    /// Creates an error tool result with no artifacts.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            message: message.into(),
            artifacts: Vec::new(),
        }
    }

    /// Returns `true` when the status is [`ToolStatus::Error`].
    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let session_id = Uuid::new_v4();
        let msg = Message::user("Hello", session_id);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.session_id, session_id);
    }

    #[test]
    fn test_tool_result_constructors() {
        let ok = ToolResult::success("done", vec![PathBuf::from("/tmp/POSCAR")]);
        assert!(!ok.is_error());
        assert_eq!(ok.artifacts.len(), 1);

        let err = ToolResult::error("failed");
        assert!(err.is_error());
        assert!(err.artifacts.is_empty());
    }

    #[test]
    fn test_tool_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ToolStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(serde_json::to_string(&ToolStatus::Error).unwrap(), "\"error\"");
    }
}
