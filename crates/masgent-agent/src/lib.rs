//! Conversational tool use for Masgent.
//!
//! An [`AgentSession`] streams replies from an [`LlmBackend`], validates the
//! tool call a reply carries against the [`ToolRegistry`](masgent_tools::ToolRegistry)
//! and executes it only after the user explicitly confirms.
//!
//! # Main entry points
//!
//! - [`AgentSession`]: The per-conversation state machine.
//! - [`OpenAiBackend`]: Streaming OpenAI-compatible chat completions.
//! - [`ModelConfig`]: The `[model]` configuration section.

/// Model backends.
pub mod backends;
/// Model configuration.
pub mod config;
/// Confirmation detection.
pub mod confirmation;
/// Bounded history sent to the model.
pub mod context;
/// Aggregated and in-flight model replies.
pub mod llm;
/// The system prompt.
pub mod prompt;
/// The per-conversation state machine.
pub mod session;
/// Streaming events.
pub mod stream;

pub use backends::openai::OpenAiBackend;
pub use backends::sse::SseAccumulator;
pub use backends::LlmBackend;
pub use config::{LlmProvider, ModelConfig};
pub use confirmation::{confirmation_prompt, is_affirmative, is_confirmation_prompt};
pub use context::ContextWindow;
pub use llm::{LlmResponse, ReplyStream};
pub use prompt::SYSTEM_PROMPT;
pub use session::{AgentSession, AgentState, PendingCall, ReplySink, TurnOutcome};
pub use stream::StreamEvent;
