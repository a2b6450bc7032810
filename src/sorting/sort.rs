//! The sort driver.
//!
//! Masters and non-masters are sorted in two separate graphs: master-flag
//! edges alone would otherwise contribute the large majority of all edges,
//! and every reachability query scales with edge count. Constraints that
//! would cross the partition boundary backwards are rejected up front.

use std::cmp::Ordering;

use indexmap::IndexMap;
use tracing::{debug, error, trace};

use crate::error::{EdgeType, SortError, Vertex};
use crate::filename::compare_filenames;
use crate::game::GameType;
use crate::metadata::{File, Group};
use crate::sorting::graph::PluginGraph;
use crate::sorting::groups::{get_predecessor_groups, merged_groups_map};
use crate::sorting::sorting_data::{PluginSortingData, PredecessorGroupPlugin};

/// Check that no master's constraints point at a non-master, and that no
/// hardcoded plugin is a non-master while masters exist.
///
/// Such a constraint cannot be honoured: the master-flag relationship would
/// have to be violated. The offending pair is reported as a synthesised
/// two-vertex cycle.
fn validate_specific_and_hardcoded_edges(
    masters: &[PluginSortingData<'_>],
    non_masters: &[PluginSortingData<'_>],
    hardcoded_plugins: &[String],
) -> Result<(), SortError> {
    let is_non_master = |name: &str| {
        non_masters
            .iter()
            .any(|plugin| compare_filenames(plugin.name(), name) == Ordering::Equal)
    };

    let fail = |name: &str, edge_type: EdgeType, master: &PluginSortingData<'_>| {
        Err(SortError::CyclicInteraction(vec![
            Vertex::new(name, edge_type),
            Vertex::new(master.name(), EdgeType::MasterFlag),
        ]))
    };

    for plugin in masters {
        for master in plugin.masters() {
            if is_non_master(master) {
                return fail(master, EdgeType::Master, plugin);
            }
        }

        let file_lists: [(&[File], EdgeType); 4] = [
            (plugin.masterlist_requirements(), EdgeType::MasterlistRequirement),
            (plugin.user_requirements(), EdgeType::UserRequirement),
            (plugin.masterlist_load_after(), EdgeType::MasterlistLoadAfter),
            (plugin.user_load_after(), EdgeType::UserLoadAfter),
        ];

        for (files, edge_type) in file_lists {
            for file in files {
                if is_non_master(file.name().as_str()) {
                    return fail(file.name().as_str(), edge_type, plugin);
                }
            }
        }
    }

    if let Some(first_master) = masters.first() {
        for name in hardcoded_plugins {
            if is_non_master(name) {
                return fail(name, EdgeType::Hardcoded, first_master);
            }
        }
    }

    Ok(())
}

/// Expand each group's predecessor groups into predecessor plugins.
fn get_predecessor_group_plugins_map(
    plugins: &[PluginSortingData<'_>],
    masterlist_groups: &[Group],
    user_groups: &[Group],
) -> Result<IndexMap<String, Vec<PredecessorGroupPlugin>>, SortError> {
    let predecessor_groups = get_predecessor_groups(masterlist_groups, user_groups)?;

    let mut group_plugins: IndexMap<String, Vec<&PluginSortingData<'_>>> = IndexMap::new();
    for plugin in plugins {
        group_plugins
            .entry(plugin.group().to_string())
            .or_default()
            .push(plugin);
    }

    let mut predecessor_group_plugins = IndexMap::new();
    for (group_name, predecessors) in &predecessor_groups {
        let mut entries: Vec<PredecessorGroupPlugin> = Vec::new();

        for predecessor in predecessors {
            let Some(members) = group_plugins.get(predecessor.name.as_str()) else {
                continue;
            };

            for member in members {
                entries.push(PredecessorGroupPlugin {
                    name: member.name().to_string(),
                    path_involves_user_metadata: predecessor.path_involves_user_metadata
                        || member.group_is_user_metadata(),
                });
            }
        }

        predecessor_group_plugins.insert(group_name.clone(), entries);
    }

    Ok(predecessor_group_plugins)
}

/// Sort one partition of the plugins through a fresh graph.
fn sort_partition(
    plugins: Vec<PluginSortingData<'_>>,
    game_type: GameType,
    hardcoded_plugins: &[String],
    groups: &IndexMap<String, Group>,
) -> Result<Vec<String>, SortError> {
    let mut graph = PluginGraph::new();

    for plugin in plugins {
        graph.add_vertex(plugin);
    }

    graph.add_specific_edges();
    graph.add_hardcoded_plugin_edges(hardcoded_plugins, game_type);
    graph.add_group_edges(groups)?;

    // From this point on edges are only added when they don't close a
    // cycle, and tie-breaking is by far the slowest phase, so checking now
    // gives faster feedback than checking only at the end.
    graph.check_for_cycles()?;

    graph.add_overlap_edges()?;
    graph.add_tie_break_edges();

    graph.check_for_cycles()?;

    let path = graph.topological_sort();

    if let Some((first, second)) = graph.is_hamiltonian_path(&path) {
        error!(
            "The path is not unique. No edge exists between {} and {}.",
            graph.plugin(first).name(),
            graph.plugin(second).name()
        );
    }

    Ok(graph.to_plugin_names(&path))
}

/// Compute a load order for the given plugins.
///
/// The result is a permutation of the inputs in which masters precede
/// non-masters, every constraint holds, and identical inputs always
/// produce identical output.
///
/// Fails with [`SortError::CyclicInteraction`] when metadata constraints
/// conflict and [`SortError::UndefinedGroup`] when a plugin or group
/// references a group that does not exist.
pub fn sort_plugins(
    mut plugins_sorting_data: Vec<PluginSortingData<'_>>,
    game_type: GameType,
    masterlist_groups: &[Group],
    user_groups: &[Group],
    early_loading_plugins: &[String],
) -> Result<Vec<String>, SortError> {
    if plugins_sorting_data.is_empty() {
        return Ok(Vec::new());
    }

    // The order vertices are created in can affect which tie-break edges
    // are added and so the final result. Sort by filename to fix the
    // iteration order independently of any input state such as the current
    // load order, so that sorting, applying and sorting again is stable.
    plugins_sorting_data.sort_by(|lhs, rhs| compare_filenames(lhs.name(), rhs.name()));

    let groups = merged_groups_map(masterlist_groups, user_groups);
    let predecessor_group_plugins =
        get_predecessor_group_plugins_map(&plugins_sorting_data, masterlist_groups, user_groups)?;

    for plugin in &mut plugins_sorting_data {
        trace!(
            "Plugin \"{}\" belongs to group \"{}\", setting predecessor group plugins",
            plugin.name(),
            plugin.group()
        );

        let Some(entries) = predecessor_group_plugins.get(plugin.group()) else {
            return Err(SortError::UndefinedGroup(plugin.group().to_string()));
        };

        plugin.set_predecessor_group_plugins(entries.clone());
    }

    let (masters, non_masters): (Vec<_>, Vec<_>) = plugins_sorting_data
        .into_iter()
        .partition(|plugin| plugin.is_master());

    validate_specific_and_hardcoded_edges(&masters, &non_masters, early_loading_plugins)?;

    debug!(
        "Sorting {} masters and {} non-masters.",
        masters.len(),
        non_masters.len()
    );

    let mut new_load_order =
        sort_partition(masters, game_type, early_loading_plugins, &groups)?;

    let non_masters_load_order =
        sort_partition(non_masters, game_type, early_loading_plugins, &groups)?;

    new_load_order.extend(non_masters_load_order);

    debug!("Calculated load order:");
    for name in &new_load_order {
        debug!("\t{}", name);
    }

    Ok(new_load_order)
}
