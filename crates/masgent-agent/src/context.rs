use masgent_core::{Message, Role};

/// Selects the slice of a transcript that is sent to the model.
///
/// The transcript itself is never truncated; only the view is bounded.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    system_prompt: Option<String>,
    max_messages: usize,
}

impl ContextWindow {
    /// A window over the last `max_messages` transcript messages.
    pub fn new(max_messages: usize) -> Self {
        Self {
            system_prompt: None,
            max_messages,
        }
    }

    /// Sets the instructions sent ahead of the selected messages.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Instructions sent ahead of the selected messages, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// How many recent messages are sent.
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// The last `max_messages` messages, advanced past any leading tool turns
    /// so a tool result is never sent without its invocation.
    pub fn select<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        let start = messages.len().saturating_sub(self.max_messages);
        let window = &messages[start..];
        let skip = window
            .iter()
            .take_while(|m| m.role == Role::Tool)
            .count();
        &window[skip..]
    }

    /// Rough token estimation (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self, messages: &[Message]) -> usize {
        let sys_tokens = self.system_prompt.as_ref().map_or(0, |s| s.len() / 4);
        let msg_tokens: usize = messages.iter().map(|m| m.content.len() / 4).sum();
        sys_tokens + msg_tokens
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn transcript(roles: &[Role]) -> Vec<Message> {
        let session = Uuid::new_v4();
        roles
            .iter()
            .enumerate()
            .map(|(i, role)| Message::new(*role, format!("m{i}"), session))
            .collect()
    }

    #[test]
    fn test_short_transcript_is_sent_whole() {
        let messages = transcript(&[Role::User, Role::Assistant, Role::User]);
        let window = ContextWindow::new(200);
        assert_eq!(window.select(&messages).len(), 3);
    }

    #[test]
    fn test_keeps_most_recent() {
        let messages = transcript(&[Role::User, Role::Assistant, Role::User, Role::Assistant]);
        let window = ContextWindow::new(2);
        let selected = window.select(&messages);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].content, "m2");
    }

    #[test]
    fn test_never_starts_with_tool_turn() {
        let messages = transcript(&[
            Role::User,
            Role::Tool,
            Role::Tool,
            Role::Assistant,
            Role::User,
        ]);
        let window = ContextWindow::new(4);
        let selected = window.select(&messages);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].role, Role::Assistant);
    }

    #[test]
    fn test_estimated_tokens() {
        let session = Uuid::new_v4();
        let messages = vec![Message::user("abcdefgh", session)];
        let window = ContextWindow::new(10).with_system_prompt("abcd");
        assert_eq!(window.estimated_tokens(&messages), 3);
    }
}
