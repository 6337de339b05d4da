//! Conversation types: senders, messages, modes and the append-only history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input mode of a chat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Typed input, replies shown only
    #[default]
    Text,
    /// Spoken input, replies spoken back
    Voice,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Text => "text",
            ChatMode::Voice => "voice",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "chat" => Some(ChatMode::Text),
            "voice" | "speech" => Some(ChatMode::Voice),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The farmer typing or speaking
    User,
    /// The assistant
    Agent,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message. Never mutated once appended to a [`History`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message
    pub sender: Sender,
    /// Message text
    pub text: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create an agent message
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text)
    }
}

/// Ordered, append-only message history.
///
/// The only way to remove messages is [`History::reset`], which replaces the
/// whole history with a single welcome message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// History holding just the given welcome message
    pub fn with_welcome(welcome: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::agent(welcome)],
        }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace everything with a fresh welcome message
    pub fn reset(&mut self, welcome: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::agent(welcome));
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Tell me about soil");
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, "Tell me about soil");

        let msg = Message::agent("Hello!");
        assert_eq!(msg.sender, Sender::Agent);
    }

    #[test]
    fn test_history_preserves_order() {
        let messages: Vec<Message> = (0..5)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {}", i))
                } else {
                    Message::agent(format!("answer {}", i))
                }
            })
            .collect();

        let mut history = History::default();
        for msg in &messages {
            history.push(msg.clone());
        }

        assert_eq!(history.len(), 5);
        assert_eq!(history.as_slice(), messages.as_slice());
    }

    #[test]
    fn test_history_reset() {
        let mut history = History::with_welcome("hi");
        history.push(Message::user("weather?"));
        history.push(Message::agent("sunny"));

        history.reset("namaste");
        assert_eq!(history.len(), 1);
        let only = history.last().unwrap();
        assert_eq!(only.sender, Sender::Agent);
        assert_eq!(only.text, "namaste");
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(ChatMode::from_str_loose("Voice"), Some(ChatMode::Voice));
        assert_eq!(ChatMode::from_str_loose("text"), Some(ChatMode::Text));
        assert_eq!(ChatMode::from_str_loose("video"), None);
        assert_eq!(ChatMode::default(), ChatMode::Text);
    }
}
