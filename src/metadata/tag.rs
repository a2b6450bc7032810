//! Bash Tag suggestions.

use serde::{Deserialize, Serialize};

/// A suggestion to add or remove a Bash Tag for a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    is_addition: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl Tag {
    pub fn addition(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_addition: true,
            condition: None,
        }
    }

    pub fn removal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_addition: false,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_addition(&self) -> bool {
        self.is_addition
    }

    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}
