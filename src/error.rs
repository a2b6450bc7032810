//! Error types for the sorting engine.
//!
//! All sorting failures are fatal to the current sort: no partial load order
//! is ever returned. [`SortError::CyclicInteraction`] and
//! [`SortError::UndefinedGroup`] carry structured payloads so callers can
//! point users at the metadata that needs fixing.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of constraint that an edge in the plugin graph represents.
///
/// Variants are listed in the order their edges are added during a sort;
/// edges added in earlier phases are never overridden by later phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// A position enforced by the game engine itself.
    Hardcoded,
    /// Every master loads before every non-master.
    MasterFlag,
    /// A plugin loads after the masters its header declares.
    Master,
    /// A "requires" entry from the masterlist.
    MasterlistRequirement,
    /// A "requires" entry from user metadata.
    UserRequirement,
    /// A "load after" entry from the masterlist.
    MasterlistLoadAfter,
    /// A "load after" entry from user metadata.
    UserLoadAfter,
    /// Derived from group membership.
    Group,
    /// Plugins overriding more records (or loading more assets) load first.
    Overlap,
    /// Last-resort edge forcing a unique sort result.
    TieBreak,
}

impl EdgeType {
    /// A human-readable description of the edge type, as used in log output
    /// and cycle reports.
    pub fn description(self) -> &'static str {
        match self {
            EdgeType::Hardcoded => "Hardcoded",
            EdgeType::MasterFlag => "Master Flag",
            EdgeType::Master => "Master",
            EdgeType::MasterlistRequirement => "Masterlist Requirement",
            EdgeType::UserRequirement => "User Requirement",
            EdgeType::MasterlistLoadAfter => "Masterlist Load After",
            EdgeType::UserLoadAfter => "User Load After",
            EdgeType::Group => "Group",
            EdgeType::Overlap => "Overlap",
            EdgeType::TieBreak => "Tie Break",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// An element of a cycle report: a plugin or group name together with the
/// type of the edge leading to the next element.
///
/// The last vertex's edge leads back to the first, closing the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    name: String,
    out_edge_type: Option<EdgeType>,
}

impl Vertex {
    pub fn new(name: impl Into<String>, out_edge_type: EdgeType) -> Self {
        Self {
            name: name.into(),
            out_edge_type: Some(out_edge_type),
        }
    }

    /// A vertex with no recorded outgoing edge.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            out_edge_type: None,
        }
    }

    /// The plugin or group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type of the edge leading to the next vertex in the cycle, if
    /// recorded.
    pub fn out_edge_type(&self) -> Option<EdgeType> {
        self.out_edge_type
    }
}

/// Render a cycle as `A --[Master]-> B --[Group]-> A`.
fn describe_cycle(cycle: &[Vertex]) -> String {
    let mut description = String::new();

    for vertex in cycle {
        description.push_str(vertex.name());
        if let Some(edge_type) = vertex.out_edge_type() {
            description.push_str(&format!(" --[{}]-> ", edge_type));
        }
    }

    if let Some(first) = cycle.first() {
        description.push_str(first.name());
    }

    description
}

/// Errors that can occur while sorting a load order.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SortError {
    /// Metadata constraints form a cycle. The payload holds the vertices on
    /// the cycle, each tagged with the type of the edge to its successor.
    #[error("cyclic interaction detected: {}", describe_cycle(.0))]
    CyclicInteraction(Vec<Vertex>),

    /// A plugin or an after-group entry references a group that does not
    /// exist in the merged group list.
    #[error("the group \"{0}\" does not exist")]
    UndefinedGroup(String),

    /// The external plugin parser failed to read a plugin's contents.
    #[error("failed to parse plugin \"{plugin}\": {reason}")]
    PluginParse { plugin: String, reason: String },

    /// A file could not be read.
    #[error("failed to access \"{path}\": {reason}")]
    FileAccess { path: String, reason: String },

    /// The external condition evaluator rejected a condition string.
    #[error("invalid condition syntax in \"{condition}\": {reason}")]
    ConditionSyntax { condition: String, reason: String },

    /// An argument outside the domain of the operation, e.g. asking a plugin
    /// to compare itself against an object from a different parser.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl SortError {
    /// The vertices of the reported cycle, if this is a cycle error.
    pub fn cycle(&self) -> Option<&[Vertex]> {
        match self {
            SortError::CyclicInteraction(cycle) => Some(cycle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_description_chains_edge_types() {
        let error = SortError::CyclicInteraction(vec![
            Vertex::new("A.esp", EdgeType::Master),
            Vertex::new("B.esp", EdgeType::Group),
        ]);

        assert_eq!(
            error.to_string(),
            "cyclic interaction detected: A.esp --[Master]-> B.esp --[Group]-> A.esp"
        );
    }

    #[test]
    fn test_edge_type_descriptions() {
        assert_eq!(EdgeType::MasterFlag.to_string(), "Master Flag");
        assert_eq!(EdgeType::TieBreak.to_string(), "Tie Break");
        assert_eq!(
            EdgeType::MasterlistRequirement.to_string(),
            "Masterlist Requirement"
        );
    }

    #[test]
    fn test_cycle_accessor() {
        let cycle = vec![Vertex::new("X.esp", EdgeType::UserRequirement)];
        let error = SortError::CyclicInteraction(cycle.clone());

        assert_eq!(error.cycle(), Some(cycle.as_slice()));
        assert_eq!(SortError::UndefinedGroup("g".into()).cycle(), None);
    }
}
