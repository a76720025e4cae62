//! Conversation transcript storage for Masgent.

/// The append-only transcript.
pub mod session;

pub use session::Session;
