use crate::backends::LlmBackend;
use crate::confirmation::{confirmation_prompt, is_affirmative, is_confirmation_prompt};
use crate::context::ContextWindow;
use crate::llm::LlmResponse;
use crate::stream::StreamEvent;
use masgent_core::{MasgentError, MasgentResult, ToolCall, ToolResult};
use masgent_session::Session;
use masgent_tools::{ParameterSet, Rejection, ToolRegistry};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where an [`AgentSession`] stands between turns and while handling one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Idle, waiting for input.
    AwaitingUserTurn,
    /// A model reply is streaming.
    StreamingReply,
    /// A validated call waits for the user's confirmation.
    ToolCallPending,
    /// A tool ran during the current turn.
    ToolExecuted,
    /// No further turns are accepted.
    Ended,
}

/// Receives reply text as it becomes available.
pub trait ReplySink: Send {
    /// Receives the next piece of reply text.
    fn delta(&mut self, text: &str);

    /// The reply for the current turn is complete.
    fn end(&mut self) {}
}

impl ReplySink for String {
    fn delta(&mut self, text: &str) {
        self.push_str(text);
    }
}

/// A validated tool call awaiting confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    /// Id the model gave the call.
    pub call_id: String,
    /// Registered tool name.
    pub tool: String,
    /// Validated arguments.
    pub params: ParameterSet,
}

/// What a user turn resulted in.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// Plain model text.
    Reply(String),
    /// A proposed call was missing or had an invalid parameter.
    Clarification {
        tool: String,
        field: String,
        question: String,
    },
    /// A fully validated call now waits for an explicit yes.
    ConfirmationRequested { tool: String, prompt: String },
    /// A tool ran; its message was the reply.
    Executed { tool: String, result: ToolResult },
}

impl TurnOutcome {
    /// The text surfaced to the user for this turn.
    pub fn reply(&self) -> &str {
        match self {
            TurnOutcome::Reply(text) => text,
            TurnOutcome::Clarification { question, .. } => question,
            TurnOutcome::ConfirmationRequested { prompt, .. } => prompt,
            TurnOutcome::Executed { result, .. } => &result.message,
        }
    }
}

/// One conversation with the model, from entering agent mode until leaving it.
///
/// Every user turn is appended to the transcript and answered by streaming a
/// model reply. A tool call proposed by the model is validated at once; it is
/// executed only after an explicit confirmation, and at most once per turn.
pub struct AgentSession {
    backend: Arc<dyn LlmBackend>,
    registry: Arc<ToolRegistry>,
    context: ContextWindow,
    transcript: Session,
    state: AgentState,
    pending: Option<PendingCall>,
}

impl AgentSession {
    /// Starts a session with an empty transcript.
    pub fn new(backend: Arc<dyn LlmBackend>, registry: Arc<ToolRegistry>, context: ContextWindow) -> Self {
        let transcript = Session::new();
        info!(session_id = %transcript.id(), "Agent session started");
        Self {
            backend,
            registry,
            context,
            transcript,
            state: AgentState::AwaitingUserTurn,
            pending: None,
        }
    }

    /// Unique id.
    pub fn id(&self) -> Uuid {
        self.transcript.id()
    }

    /// Current state.
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Every turn so far, including tool invocations and results.
    pub fn transcript(&self) -> &Session {
        &self.transcript
    }

    /// The call waiting for confirmation, if any.
    pub fn pending(&self) -> Option<&PendingCall> {
        self.pending.as_ref()
    }

    /// Ends the session. Any pending call is dropped and further turns fail.
    pub fn end(&mut self) {
        if self.state != AgentState::Ended {
            info!(
                session_id = %self.transcript.id(),
                messages = self.transcript.message_count(),
                "Agent session ended"
            );
        }
        self.pending = None;
        self.state = AgentState::Ended;
    }

    /// Handles one user turn, surfacing the reply through `sink`.
    pub async fn handle_turn(
        &mut self,
        input: &str,
        sink: &mut dyn ReplySink,
    ) -> MasgentResult<TurnOutcome> {
        if self.state == AgentState::Ended {
            return Err(MasgentError::Session("agent session has ended".to_string()));
        }

        let input = input.trim();
        let after_prompt = self
            .transcript
            .last_assistant()
            .is_some_and(|m| is_confirmation_prompt(&m.content));
        self.transcript.add_user(input);
        let affirmative = is_affirmative(input);
        let mut may_execute = affirmative && after_prompt;

        if let Some(pending) = self.pending.take() {
            if affirmative {
                return Ok(self.execute(pending, false, sink).await);
            }
            debug!(
                session_id = %self.transcript.id(),
                tool = %pending.tool,
                "Pending tool call discarded"
            );
            may_execute = false;
        }

        self.state = AgentState::StreamingReply;
        let (response, streamed) = match self.stream_reply(sink).await {
            Ok(reply) => reply,
            Err(e) => {
                self.state = AgentState::AwaitingUserTurn;
                return Err(e);
            }
        };

        match response {
            LlmResponse::Text(text) => {
                self.transcript.add_assistant(text.clone());
                sink.end();
                self.state = AgentState::AwaitingUserTurn;
                Ok(TurnOutcome::Reply(text))
            }
            LlmResponse::ToolUse {
                content,
                tool_calls,
            } => {
                let content = content.unwrap_or_default();
                if tool_calls.len() > 1 {
                    warn!(
                        session_id = %self.transcript.id(),
                        dropped = tool_calls.len() - 1,
                        "Only the first tool call of a reply is considered"
                    );
                }
                let Some(call) = tool_calls.into_iter().next() else {
                    self.transcript.add_assistant(content.clone());
                    sink.end();
                    self.state = AgentState::AwaitingUserTurn;
                    return Ok(TurnOutcome::Reply(content));
                };
                if !content.trim().is_empty() {
                    self.transcript.add_assistant(content);
                }
                Ok(self.resolve_call(call, may_execute, streamed, sink).await)
            }
        }
    }

    async fn stream_reply(&self, sink: &mut dyn ReplySink) -> MasgentResult<(LlmResponse, bool)> {
        let window = self.context.select(self.transcript.messages());
        let specs = self.registry.specs();
        debug!(
            session_id = %self.transcript.id(),
            messages = window.len(),
            estimated_tokens = self.context.estimated_tokens(window),
            "Requesting model reply"
        );

        let mut stream = self
            .backend
            .chat_stream(self.context.system_prompt(), window, &specs)
            .await?;

        let mut streamed = false;
        while let Some(event) = stream.next_event().await {
            match event {
                StreamEvent::TextDelta { text } => {
                    sink.delta(&text);
                    streamed = true;
                }
                StreamEvent::ToolCallStart { name, .. } => {
                    debug!(tool = %name, "Model proposed a tool call");
                }
                StreamEvent::Error { message } => {
                    warn!(session_id = %self.transcript.id(), error = %message, "Reply stream error");
                }
                _ => {}
            }
        }

        Ok((stream.finish().await?, streamed))
    }

    async fn resolve_call(
        &mut self,
        call: ToolCall,
        may_execute: bool,
        streamed: bool,
        sink: &mut dyn ReplySink,
    ) -> TurnOutcome {
        match self.registry.validate(&call.name, &call.arguments) {
            Err(Rejection::UnknownTool(unknown)) => {
                let reply = unknown.to_string();
                self.say(&reply, streamed, sink);
                self.state = AgentState::AwaitingUserTurn;
                TurnOutcome::Reply(reply)
            }
            Err(Rejection::Invalid(failure)) => {
                debug!(tool = %call.name, field = %failure.field, "Asking for clarification");
                let question = failure.clarification();
                self.say(&question, streamed, sink);
                self.state = AgentState::AwaitingUserTurn;
                TurnOutcome::Clarification {
                    tool: call.name,
                    field: failure.field,
                    question,
                }
            }
            Ok(params) => {
                let pending = PendingCall {
                    call_id: call.id,
                    tool: call.name,
                    params,
                };
                if may_execute {
                    return self.execute(pending, streamed, sink).await;
                }
                let prompt = confirmation_prompt(&pending.tool, &pending.params.summary());
                self.say(&prompt, streamed, sink);
                let tool = pending.tool.clone();
                self.pending = Some(pending);
                self.state = AgentState::ToolCallPending;
                TurnOutcome::ConfirmationRequested { tool, prompt }
            }
        }
    }

    async fn execute(
        &mut self,
        pending: PendingCall,
        streamed: bool,
        sink: &mut dyn ReplySink,
    ) -> TurnOutcome {
        let PendingCall {
            call_id,
            tool,
            params,
        } = pending;
        info!(
            session_id = %self.transcript.id(),
            tool = %tool,
            params = %params.summary(),
            "Executing confirmed tool call"
        );
        self.state = AgentState::ToolCallPending;
        self.transcript.add_tool(
            format!("{tool}({})", params.summary()),
            &[
                ("kind", json!("invocation")),
                ("call_id", json!(call_id)),
                ("tool", json!(tool)),
                ("arguments", params.to_json()),
            ],
        );

        let result = match self.registry.execute(&tool, params).await {
            Ok(result) => result,
            Err(unknown) => ToolResult::error(unknown.to_string()),
        };
        self.state = AgentState::ToolExecuted;
        self.transcript.add_tool(
            result.message.clone(),
            &[
                ("kind", json!("result")),
                ("call_id", json!(call_id)),
                ("status", json!(result.status)),
            ],
        );

        self.state = AgentState::StreamingReply;
        self.say(&result.message, streamed, sink);
        self.state = AgentState::AwaitingUserTurn;
        TurnOutcome::Executed { tool, result }
    }

    /// Surfaces a reply produced by the session rather than the model.
    fn say(&mut self, text: &str, streamed: bool, sink: &mut dyn ReplySink) {
        if streamed {
            sink.delta("\n");
        }
        sink.delta(text);
        sink.end();
        self.transcript.add_assistant(text);
    }
}

impl Drop for AgentSession {
    fn drop(&mut self) {
        self.end();
    }
}
