//! The sorting engine.
//!
//! [`sort_plugins`] drives the whole process: it takes the
//! [`PluginSortingData`] views built by the caller, validates the group
//! metadata, partitions plugins into masters and non-masters and
//! linearises each partition through a [`graph::PluginGraph`].

pub mod graph;
pub mod groups;
pub mod sort;
pub mod sorting_data;

pub use graph::PluginGraph;
pub use groups::{get_predecessor_groups, merge_groups, merged_groups_map, PredecessorGroup};
pub use sort::sort_plugins;
pub use sorting_data::{PluginSortingData, PredecessorGroupPlugin};
