/// OpenAI-compatible chat completions backend.
pub mod openai;
/// Server-sent event decoding for streamed completions.
pub mod sse;

use crate::llm::ReplyStream;
use async_trait::async_trait;
use masgent_core::{MasgentResult, Message};
use masgent_tools::ToolSpec;

/// A chat completion provider.
///
/// Implementations start the request and return as soon as the reply begins
/// streaming; transport failures before that point are returned as errors.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Starts a streamed completion over `messages`, offering `tools` to the model.
    async fn chat_stream(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[&ToolSpec],
    ) -> MasgentResult<ReplyStream>;
}
