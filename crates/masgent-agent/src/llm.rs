use crate::stream::StreamEvent;
use masgent_core::{MasgentError, MasgentResult, ToolCall};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity of the fragment channel between the reader task and the session.
pub const STREAM_BUFFER: usize = 256;

/// Aggregated model reply: plain text, or text plus tool call requests.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// Text only.
    Text(String),
    /// The model asked for one or more tools.
    ToolUse {
        /// Text streamed before the calls, if any.
        content: Option<String>,
        /// Requested calls in the order the model sent them.
        tool_calls: Vec<ToolCall>,
    },
}

impl LlmResponse {
    /// The assistant text carried by the reply, possibly empty.
    pub fn text(&self) -> &str {
        match self {
            LlmResponse::Text(text) => text,
            LlmResponse::ToolUse { content, .. } => content.as_deref().unwrap_or_default(),
        }
    }
}

/// A reply being streamed by a backend.
///
/// Fragments are drained with [`next_event`](Self::next_event); the aggregated
/// reply is obtained with [`finish`](Self::finish) once the caller is done.
pub struct ReplyStream {
    events: mpsc::Receiver<StreamEvent>,
    handle: JoinHandle<MasgentResult<LlmResponse>>,
}

impl ReplyStream {
    /// Wraps a fragment receiver and the task that aggregates the reply.
    pub fn new(
        events: mpsc::Receiver<StreamEvent>,
        handle: JoinHandle<MasgentResult<LlmResponse>>,
    ) -> Self {
        Self { events, handle }
    }

    /// Replays a fixed sequence of events followed by `response`.
    pub fn replay(events: Vec<StreamEvent>, response: LlmResponse) -> Self {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let handle = tokio::spawn(async move {
            for event in events {
                let _ = tx.send(event).await;
            }
            Ok(response)
        });
        Self::new(rx, handle)
    }

    /// Next fragment, or `None` once the producer has finished.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Waits for the producer and returns the aggregated reply.
    ///
    /// Undrained fragments are discarded.
    pub async fn finish(self) -> MasgentResult<LlmResponse> {
        let Self { events, handle } = self;
        drop(events);
        handle
            .await
            .map_err(|e| MasgentError::Agent(format!("reply stream task failed: {e}")))?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_yields_events_then_response() {
        let mut stream = ReplyStream::replay(
            vec![
                StreamEvent::TextDelta {
                    text: "Hel".to_string(),
                },
                StreamEvent::TextDelta {
                    text: "lo".to_string(),
                },
                StreamEvent::Done,
            ],
            LlmResponse::Text("Hello".to_string()),
        );

        let mut text = String::new();
        while let Some(event) = stream.next_event().await {
            if let StreamEvent::TextDelta { text: t } = event {
                text.push_str(&t);
            }
        }
        assert_eq!(text, "Hello");
        assert_eq!(stream.finish().await.unwrap(), LlmResponse::Text("Hello".to_string()));
    }

    #[tokio::test]
    async fn test_finish_without_draining() {
        let events = (0..STREAM_BUFFER * 2)
            .map(|i| StreamEvent::TextDelta {
                text: i.to_string(),
            })
            .collect();
        let stream = ReplyStream::replay(events, LlmResponse::Text("done".to_string()));
        let response = stream.finish().await.unwrap();
        assert_eq!(response.text(), "done");
    }

    #[test]
    fn test_tool_use_text() {
        let response = LlmResponse::ToolUse {
            content: None,
            tool_calls: vec![],
        };
        assert_eq!(response.text(), "");
    }
}
