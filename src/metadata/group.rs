//! Plugin groups.

use serde::{Deserialize, Serialize};

/// A named bucket of plugins that loads after other groups.
///
/// Groups form a directed acyclic graph: each `after_groups` entry means
/// "this group's plugins load after that group's plugins". Plugins without
/// explicit group metadata belong to the implicit default group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    after_groups: Vec<String>,
}

impl Group {
    /// The name of the implicit group plugins belong to when no metadata
    /// assigns them one.
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            after_groups: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_after_groups(mut self, after_groups: Vec<String>) -> Self {
        self.after_groups = after_groups;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The names of the groups this group loads after.
    pub fn after_groups(&self) -> &[String] {
        &self.after_groups
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_group_has_expected_name() {
        assert_eq!(Group::default().name(), "default");
        assert!(Group::default().after_groups().is_empty());
    }

    #[test]
    fn test_after_groups_are_preserved_in_order() {
        let group = Group::new("late")
            .with_after_groups(vec!["early".to_string(), "middle".to_string()]);

        assert_eq!(group.after_groups(), ["early", "middle"]);
    }
}
