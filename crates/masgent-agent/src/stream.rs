use serde::{Deserialize, Serialize};

/// Events emitted while a model reply streams in.
///
/// Text fragments are surfaced to the user as they arrive; tool call events
/// only report progress, the aggregated call is read from the final response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of assistant text.
    TextDelta { text: String },

    /// The model started a tool call.
    ToolCallStart { id: String, name: String },

    /// A fragment of the tool call's JSON arguments.
    ToolCallDelta { id: String, arguments_delta: String },

    /// A tool call's arguments are complete.
    ToolCallEnd { id: String },

    /// The stream finished.
    Done,

    /// The stream broke off.
    Error { message: String },
}
