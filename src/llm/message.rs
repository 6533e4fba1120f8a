use super::AdapterRequest;

/// One entry of a provider chat conversation
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    /// Builds the conversation sent for a single-turn request:
    /// the assembled system prompt, if any, followed by the user prompt.
    pub fn conversation(request: &AdapterRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt() {
            messages.push(ChatMessage::new("system", &system));
        }
        messages.push(ChatMessage::new("user", &request.prompt));
        messages
    }

    /// Splits system messages out of a conversation, for providers that take the
    /// system prompt as a separate field.
    pub fn split_system(messages: Vec<ChatMessage>) -> (Option<String>, Vec<ChatMessage>) {
        let (system, rest): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|msg| msg.role == "system");
        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .into_iter()
                    .map(|m| m.content)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };
        (system, rest)
    }
}
