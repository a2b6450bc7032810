//! Messages attached to plugins by metadata.

use serde::{Deserialize, Serialize};

/// The severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Say,
    Warn,
    Error,
}

/// A message to show the user about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    message_type: MessageType,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl Message {
    pub fn new(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_with_different_conditions_are_distinct() {
        let plain = Message::new(MessageType::Warn, "Obsolete.");
        let conditioned = plain.clone().with_condition("version(\"A.esp\", \"1.0\", <)");

        assert_ne!(plain, conditioned);
        assert_eq!(plain, Message::new(MessageType::Warn, "Obsolete."));
    }
}
