use crate::llm::LlmResponse;
use crate::stream::StreamEvent;
use masgent_core::{MasgentError, MasgentResult, ToolCall};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Incremental decoder for OpenAI-style `text/event-stream` chat replies.
///
/// Bytes go in as they arrive; each complete `data:` line turns into zero or
/// more [`StreamEvent`]s, and [`finish`](Self::finish) assembles the reply.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    buffer: Vec<u8>,
    text: String,
    calls: BTreeMap<u64, PartialCall>,
    error: Option<String>,
    done: bool,
}

impl SseAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the response body. Partial lines are kept until the
    /// rest arrives, so multi-byte characters may straddle chunks.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.line(line.trim(), &mut events);
        }
        events
    }

    /// Processes a trailing line left without a newline.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        let line = String::from_utf8_lossy(&rest);
        self.line(line.trim(), &mut events);
        events
    }

    /// Whether the stream signalled completion.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consumes the accumulator and returns the aggregated reply, or the streamed error.
    pub fn finish(self) -> MasgentResult<LlmResponse> {
        if let Some(message) = self.error {
            return Err(MasgentError::Http(message));
        }

        let tool_calls: Vec<ToolCall> = self
            .calls
            .into_values()
            .filter(|call| !call.name.is_empty())
            .map(|call| ToolCall {
                id: call.id,
                name: call.name,
                arguments: parse_arguments(&call.arguments),
            })
            .collect();

        if tool_calls.is_empty() {
            Ok(LlmResponse::Text(self.text))
        } else {
            Ok(LlmResponse::ToolUse {
                content: (!self.text.is_empty()).then_some(self.text),
                tool_calls,
            })
        }
    }

    fn line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        if line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
            return;
        };
        if data == "[DONE]" {
            self.mark_done(events);
            return;
        }
        let Ok(event) = serde_json::from_str::<Value>(data) else {
            return;
        };

        if let Some(error) = event.get("error").filter(|e| !e.is_null()) {
            let message = error["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            events.push(StreamEvent::Error {
                message: message.clone(),
            });
            self.error = Some(message);
            return;
        }

        let choice = &event["choices"][0];
        let delta = &choice["delta"];

        if let Some(content) = delta["content"].as_str() {
            if !content.is_empty() {
                self.text.push_str(content);
                events.push(StreamEvent::TextDelta {
                    text: content.to_string(),
                });
            }
        }

        if let Some(fragments) = delta["tool_calls"].as_array() {
            for fragment in fragments {
                self.tool_fragment(fragment, events);
            }
        }

        if let Some(reason) = choice["finish_reason"].as_str() {
            if reason == "tool_calls" {
                for call in self.calls.values() {
                    events.push(StreamEvent::ToolCallEnd {
                        id: call.id.clone(),
                    });
                }
            }
            self.mark_done(events);
        }
    }

    fn tool_fragment(&mut self, fragment: &Value, events: &mut Vec<StreamEvent>) {
        let index = fragment["index"].as_u64().unwrap_or(0);
        let entry = self.calls.entry(index).or_default();

        if let Some(id) = fragment["id"].as_str() {
            entry.id = id.to_string();
        }
        if let Some(name) = fragment["function"]["name"].as_str() {
            if entry.name.is_empty() && !name.is_empty() {
                entry.name = name.to_string();
                events.push(StreamEvent::ToolCallStart {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                });
            }
        }
        if let Some(args) = fragment["function"]["arguments"].as_str() {
            if !args.is_empty() {
                entry.arguments.push_str(args);
                events.push(StreamEvent::ToolCallDelta {
                    id: entry.id.clone(),
                    arguments_delta: args.to_string(),
                });
            }
        }
    }

    fn mark_done(&mut self, events: &mut Vec<StreamEvent>) {
        if !self.done {
            self.done = true;
            events.push(StreamEvent::Done);
        }
    }
}

/// Blank arguments mean "no arguments"; unparseable ones are passed through as
/// a string so validation reports them.
fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
