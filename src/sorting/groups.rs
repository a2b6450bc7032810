//! The group graph.
//!
//! Groups are merged from the masterlist and user group lists into a DAG
//! whose edges mean "loads after". Sorting needs two views of it: the
//! transitive predecessors of every group (with a record of whether user
//! metadata is involved in reaching them), and the set of groups lying on
//! the paths between two groups, used when breaking cycles caused by
//! default-group plugins.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::trace;

use crate::error::{EdgeType, SortError, Vertex};
use crate::metadata::Group;

/// A group that must load before another group, with a flag that is true
/// iff every path between the two groups traverses at least one after-edge
/// added by user metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredecessorGroup {
    pub name: String,
    pub path_involves_user_metadata: bool,
}

/// Merge the masterlist and user group lists.
///
/// Groups sharing a name have their after-group lists unioned, with the
/// user list's new entries appended. The implicit default group is added if
/// neither list defines it.
pub fn merge_groups(masterlist_groups: &[Group], user_groups: &[Group]) -> Vec<Group> {
    let mut merged: Vec<Group> = masterlist_groups.to_vec();

    for user_group in user_groups {
        match merged.iter_mut().find(|g| g.name() == user_group.name()) {
            Some(existing) => {
                let mut after_groups = existing.after_groups().to_vec();
                for after in user_group.after_groups() {
                    if !after_groups.contains(after) {
                        after_groups.push(after.clone());
                    }
                }

                let mut updated = Group::new(existing.name()).with_after_groups(after_groups);
                if let Some(description) =
                    user_group.description().or_else(|| existing.description())
                {
                    updated = updated.with_description(description);
                }
                *existing = updated;
            }
            None => merged.push(user_group.clone()),
        }
    }

    if !merged.iter().any(|g| g.name() == Group::DEFAULT_NAME) {
        merged.push(Group::default());
    }

    merged
}

/// Build a name-keyed map over merged groups, preserving list order.
pub fn merged_groups_map(
    masterlist_groups: &[Group],
    user_groups: &[Group],
) -> IndexMap<String, Group> {
    merge_groups(masterlist_groups, user_groups)
        .into_iter()
        .map(|group| (group.name().to_string(), group))
        .collect()
}

/// An after-edge in the merged group graph, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AfterEdge {
    target: String,
    is_user_metadata: bool,
}

/// The merged group graph with per-edge user-metadata tags.
fn build_edge_graph(
    masterlist_groups: &[Group],
    user_groups: &[Group],
) -> IndexMap<String, Vec<AfterEdge>> {
    let mut graph: IndexMap<String, Vec<AfterEdge>> = IndexMap::new();

    for group in masterlist_groups {
        let edges = graph.entry(group.name().to_string()).or_default();
        for after in group.after_groups() {
            if !edges.iter().any(|e| &e.target == after) {
                edges.push(AfterEdge {
                    target: after.clone(),
                    is_user_metadata: false,
                });
            }
        }
    }

    for group in user_groups {
        let edges = graph.entry(group.name().to_string()).or_default();
        for after in group.after_groups() {
            if !edges.iter().any(|e| &e.target == after) {
                edges.push(AfterEdge {
                    target: after.clone(),
                    is_user_metadata: true,
                });
            }
        }
    }

    graph.entry(Group::DEFAULT_NAME.to_string()).or_default();

    graph
}

/// Check every after-edge points at a defined group.
fn validate_edge_targets(graph: &IndexMap<String, Vec<AfterEdge>>) -> Result<(), SortError> {
    for edges in graph.values() {
        for edge in edges {
            if !graph.contains_key(&edge.target) {
                return Err(SortError::UndefinedGroup(edge.target.clone()));
            }
        }
    }

    Ok(())
}

/// Detect cycles among the group after-edges, reporting the offending path.
fn check_for_group_cycles(graph: &IndexMap<String, Vec<AfterEdge>>) -> Result<(), SortError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    let names: Vec<&String> = graph.keys().collect();
    let index_of = |name: &str| names.iter().position(|n| n.as_str() == name);

    let mut color = vec![Color::White; names.len()];
    let mut trail: Vec<Vertex> = Vec::new();

    for root in 0..names.len() {
        if color[root] != Color::White {
            continue;
        }

        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        color[root] = Color::Grey;

        while let Some(frame) = stack.last_mut() {
            let group = *frame;
            let edges = &graph[names[group.0].as_str()];

            if group.1 < edges.len() {
                frame.1 += 1;
                let edge = &edges[group.1];
                let edge_type = if edge.is_user_metadata {
                    EdgeType::UserLoadAfter
                } else {
                    EdgeType::MasterlistLoadAfter
                };
                // Targets were validated before this runs.
                let Some(target) = index_of(&edge.target) else {
                    continue;
                };

                match color[target] {
                    Color::White => {
                        if let Some(position) =
                            trail.iter().position(|v| v.name() == names[group.0].as_str())
                        {
                            trail.truncate(position);
                        }
                        trail.push(Vertex::new(names[group.0].clone(), edge_type));

                        color[target] = Color::Grey;
                        stack.push((target, 0));
                    }
                    Color::Grey => {
                        trail.push(Vertex::new(names[group.0].clone(), edge_type));
                        if let Some(position) =
                            trail.iter().position(|v| v.name() == names[target].as_str())
                        {
                            return Err(SortError::CyclicInteraction(trail[position..].to_vec()));
                        }
                    }
                    Color::Black => {}
                }
            } else {
                color[group.0] = Color::Black;
                stack.pop();
            }
        }
    }

    Ok(())
}

/// Compute, for every group, the transitive set of groups that must load
/// before it.
///
/// Each predecessor carries a flag that is true iff every path from the
/// predecessor to the group traverses at least one user-metadata edge. Fails
/// with [`SortError::UndefinedGroup`] for dangling after-group names and
/// [`SortError::CyclicInteraction`] for cyclic group metadata.
pub fn get_predecessor_groups(
    masterlist_groups: &[Group],
    user_groups: &[Group],
) -> Result<IndexMap<String, Vec<PredecessorGroup>>, SortError> {
    trace!("Computing transitive predecessors for each group...");

    let graph = build_edge_graph(masterlist_groups, user_groups);

    validate_edge_targets(&graph)?;
    check_for_group_cycles(&graph)?;

    let mut predecessors = IndexMap::new();

    for name in graph.keys() {
        // Walk after-edges from this group, tracking per state whether the
        // path so far used a user-metadata edge. A predecessor only counts
        // as user-involved when no user-free path reaches it.
        let mut reached: IndexMap<String, [bool; 2]> = IndexMap::new();
        let mut visited: HashSet<(String, bool)> = HashSet::new();
        let mut stack: Vec<(String, bool)> = vec![(name.clone(), false)];
        visited.insert((name.clone(), false));

        while let Some((current, involves_user)) = stack.pop() {
            for edge in &graph[current.as_str()] {
                let next_involves_user = involves_user || edge.is_user_metadata;

                let flags = reached.entry(edge.target.clone()).or_insert([false; 2]);
                flags[usize::from(next_involves_user)] = true;

                if visited.insert((edge.target.clone(), next_involves_user)) {
                    stack.push((edge.target.clone(), next_involves_user));
                }
            }
        }

        let mut groups: Vec<PredecessorGroup> = reached
            .into_iter()
            .map(|(group_name, flags)| PredecessorGroup {
                name: group_name,
                path_involves_user_metadata: !flags[0],
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        predecessors.insert(name.clone(), groups);
    }

    Ok(predecessors)
}

/// The groups lying on paths from `first_group` to `last_group`, excluding
/// both endpoints.
///
/// After-edges run from later groups to earlier ones, so the walk starts at
/// `last_group` and searches for `first_group`.
pub fn find_groups_in_all_paths(
    groups: &IndexMap<String, Group>,
    first_group: &str,
    last_group: &str,
) -> Result<HashSet<String>, SortError> {
    let group = groups
        .get(last_group)
        .ok_or_else(|| SortError::UndefinedGroup(last_group.to_string()))?;

    let mut groups_in_paths =
        collect_groups_in_paths(group, first_group, groups, HashSet::new())?;

    groups_in_paths.remove(last_group);

    Ok(groups_in_paths)
}

fn collect_groups_in_paths(
    group: &Group,
    target_group_name: &str,
    groups: &IndexMap<String, Group>,
    mut visited_groups: HashSet<String>,
) -> Result<HashSet<String>, SortError> {
    if group.name() == target_group_name {
        return Ok(visited_groups);
    }

    if group.after_groups().is_empty() {
        return Ok(HashSet::new());
    }

    visited_groups.insert(group.name().to_string());

    // Recurse on each after-group independently and merge: every path to
    // the target contributes its groups.
    let mut merged_visited_groups = HashSet::new();
    for after_group_name in group.after_groups() {
        let after_group = groups
            .get(after_group_name)
            .ok_or_else(|| SortError::UndefinedGroup(after_group_name.clone()))?;

        let recursed =
            collect_groups_in_paths(after_group, target_group_name, groups, visited_groups.clone())?;

        merged_visited_groups.extend(recursed);
    }

    if merged_visited_groups.is_empty() {
        return Ok(merged_visited_groups);
    }

    visited_groups.extend(merged_visited_groups);

    Ok(visited_groups)
}
