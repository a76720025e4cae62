use super::sse::SseAccumulator;
use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use crate::llm::{ReplyStream, STREAM_BUFFER};
use crate::stream::StreamEvent;
use async_trait::async_trait;
use futures_util::StreamExt;
use masgent_core::{MasgentError, MasgentResult, Message, Role};
use masgent_tools::ToolSpec;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// OpenAI-compatible chat completions backend.
///
/// Serves OpenAI, OpenRouter, Groq and anything else that speaks the same
/// streaming API.
pub struct OpenAiBackend {
    config: ModelConfig,
    api_key: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("config", &self.config)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiBackend {
    /// Creates a backend for `config` authenticated with `api_key`.
    pub fn new(config: ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    fn build_messages(&self, system_prompt: Option<&str>, messages: &[Message]) -> Vec<Value> {
        let mut api_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system_prompt {
            api_messages.push(json!({ "role": "system", "content": sys }));
        }

        for m in messages {
            match m.role {
                Role::System => continue,
                Role::User => api_messages.push(json!({ "role": "user", "content": m.content })),
                Role::Assistant => {
                    api_messages.push(json!({ "role": "assistant", "content": m.content }));
                }
                Role::Tool => api_messages.push(tool_message(m)),
            }
        }

        api_messages
    }

    fn build_tools(&self, tools: &[&ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_schema(),
                    }
                })
            })
            .collect()
    }

    fn build_body(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[&ToolSpec],
    ) -> Value {
        let mut body = json!({
            "model": self.config.model_id,
            "messages": self.build_messages(system_prompt, messages),
            "stream": true,
        });
        body[self.config.max_tokens_field()] = json!(self.config.max_tokens);
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }
        if !tools.is_empty() {
            body["tools"] = json!(self.build_tools(tools));
        }
        body
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        if self.config.provider == LlmProvider::OpenRouter {
            request
                .header("HTTP-Referer", "https://github.com/aguang5241/masgent")
                .header("X-Title", "Masgent")
        } else {
            request
        }
    }
}

/// Tool turns carry their call in metadata and are replayed as a proper
/// assistant `tool_calls` message or `tool` result; anything else is sent as
/// plain user text.
fn tool_message(m: &Message) -> Value {
    let call_id = m.metadata.get("call_id").and_then(Value::as_str);
    let kind = m.metadata.get("kind").and_then(Value::as_str);
    match (kind, call_id) {
        (Some("invocation"), Some(id)) => {
            let name = m.metadata.get("tool").and_then(Value::as_str).unwrap_or_default();
            let arguments = m
                .metadata
                .get("arguments")
                .map(Value::to_string)
                .unwrap_or_else(|| "{}".to_string());
            json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": { "name": name, "arguments": arguments },
                }],
            })
        }
        (Some("result"), Some(id)) => {
            json!({ "role": "tool", "tool_call_id": id, "content": m.content })
        }
        _ => json!({ "role": "user", "content": m.content }),
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat_stream(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
        tools: &[&ToolSpec],
    ) -> MasgentResult<ReplyStream> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = self.build_body(system_prompt, messages, tools);
        debug!(
            model = %self.config.model_id,
            messages = messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| MasgentError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!(%status, "Chat completion request rejected");
            return Err(MasgentError::Http(format!(
                "OpenAI API error {status}: {error_body}"
            )));
        }

        let (tx, rx) = mpsc::channel::<StreamEvent>(STREAM_BUFFER);
        let mut byte_stream = resp.bytes_stream();

        let handle = tokio::spawn(async move {
            let mut acc = SseAccumulator::new();
            while let Some(chunk) = byte_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let message = format!("Stream read error: {e}");
                        let _ = tx
                            .send(StreamEvent::Error {
                                message: message.clone(),
                            })
                            .await;
                        return Err(MasgentError::Http(message));
                    }
                };
                for event in acc.push(&bytes) {
                    let _ = tx.send(event).await;
                }
            }
            for event in acc.flush() {
                let _ = tx.send(event).await;
            }
            acc.finish()
        });

        Ok(ReplyStream::new(rx, handle))
    }
}
