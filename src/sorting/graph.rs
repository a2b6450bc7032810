//! The plugin dependency graph.
//!
//! Vertices are plugins, edges are typed ordering constraints. Edges are
//! added in phases of decreasing priority; an edge is only ever added when
//! the reverse path does not already exist, so the graph stays acyclic
//! through the overlap and tie-break phases. After tie-breaking, the graph
//! admits exactly one topological order, which is the sorted load order.
//!
//! Vertices are arena-allocated: a vertex is an index into the vertex
//! vector, stable for the lifetime of the sort, with forward and reverse
//! adjacency lists per vertex.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{EdgeType, SortError, Vertex};
use crate::filename::{compare_filenames, normalize_filename, ComparableFilenameCache};
use crate::game::GameType;
use crate::metadata::Group;
use crate::sorting::groups::find_groups_in_all_paths;
use crate::sorting::sorting_data::PluginSortingData;

/// A memoised reachability table: `cache[u]` holds vertices known to be
/// reachable from `u`. Entries are only ever added, never invalidated,
/// which is sound because edges are never removed.
#[derive(Debug, Default)]
struct PathsCache {
    cache: HashMap<usize, HashSet<usize>>,
}

impl PathsCache {
    fn is_path_cached(&self, from: usize, to: usize) -> bool {
        self.cache
            .get(&from)
            .is_some_and(|descendants| descendants.contains(&to))
    }

    fn cache_path(&mut self, from: usize, to: usize) {
        self.cache.entry(from).or_default().insert(to);
    }
}

/// Decide which of two plugins should load earlier when nothing else orders
/// them.
///
/// Plugins with a current load order position sort before plugins without
/// one, and by that position between themselves. Between two plugins with
/// no position, basenames are compared as filenames, then extensions.
fn compare_plugins(lhs: &PluginSortingData<'_>, rhs: &PluginSortingData<'_>) -> Ordering {
    match (lhs.load_order_index(), rhs.load_order_index()) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(lhs_index), Some(rhs_index)) => lhs_index.cmp(&rhs_index),
        (None, None) => {
            let (lhs_basename, lhs_extension) = split_extension(lhs.name());
            let (rhs_basename, rhs_extension) = split_extension(rhs.name());

            // A .esp and a .esm plugin can share a basename.
            compare_filenames(lhs_basename, rhs_basename)
                .then_with(|| compare_filenames(lhs_extension, rhs_extension))
        }
    }
}

/// Split off the four-character extension, matching how plugin names are
/// compared: `a.esp` → (`a`, `.esp`).
fn split_extension(name: &str) -> (&str, &str) {
    let index = name.len().saturating_sub(4);
    if name.is_char_boundary(index) {
        name.split_at(index)
    } else {
        (name, "")
    }
}

fn is_plugin_in_ignore_map(
    group: &str,
    plugin_name: &str,
    group_plugins_to_ignore: &HashMap<String, HashSet<String>>,
) -> bool {
    group_plugins_to_ignore
        .get(group)
        .is_some_and(|plugins| plugins.contains(plugin_name))
}

fn should_ignore_group_edge(
    from_plugin: &PluginSortingData<'_>,
    to_plugin: &PluginSortingData<'_>,
    group_plugins_to_ignore: &HashMap<String, HashSet<String>>,
) -> bool {
    is_plugin_in_ignore_map(from_plugin.group(), to_plugin.name(), group_plugins_to_ignore)
        || is_plugin_in_ignore_map(to_plugin.group(), from_plugin.name(), group_plugins_to_ignore)
}

fn ignore_plugin_group_edges(
    plugin_name: String,
    groups: HashSet<String>,
    group_plugins_to_ignore: &mut HashMap<String, HashSet<String>>,
) {
    for group in groups {
        group_plugins_to_ignore
            .entry(group)
            .or_default()
            .insert(plugin_name.clone());
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Grey,
    Black,
}

/// A directed graph of plugins under construction during one sort.
pub struct PluginGraph<'a> {
    vertices: Vec<PluginSortingData<'a>>,
    normalized_names: Vec<String>,
    edges_out: Vec<Vec<(usize, EdgeType)>>,
    edges_in: Vec<Vec<usize>>,
    name_index: HashMap<String, usize>,
    paths_cache: PathsCache,
    filename_cache: ComparableFilenameCache,
}

impl<'a> PluginGraph<'a> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normalized_names: Vec::new(),
            edges_out: Vec::new(),
            edges_in: Vec::new(),
            name_index: HashMap::new(),
            paths_cache: PathsCache::default(),
            filename_cache: ComparableFilenameCache::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Add a vertex, returning its descriptor. Vertices are never removed.
    pub fn add_vertex(&mut self, plugin: PluginSortingData<'a>) -> usize {
        let vertex = self.vertices.len();
        self.normalized_names.push(normalize_filename(plugin.name()));
        self.name_index.insert(plugin.name().to_string(), vertex);
        self.vertices.push(plugin);
        self.edges_out.push(Vec::new());
        self.edges_in.push(Vec::new());
        vertex
    }

    pub fn plugin(&self, vertex: usize) -> &PluginSortingData<'a> {
        &self.vertices[vertex]
    }

    /// Find a vertex by filename, comparing case-insensitively. Queried
    /// names (masters, metadata references) repeat across plugins, so their
    /// normalised forms are memoised for the graph's lifetime.
    pub fn vertex_by_name(&mut self, name: &str) -> Option<usize> {
        let normalized = self.filename_cache.get_or_insert(name);
        self.normalized_names
            .iter()
            .position(|vertex_name| vertex_name.as_str() == normalized)
    }

    /// Find a vertex by its exact name. Usable when the queried name was
    /// itself taken from a vertex.
    pub fn vertex_by_exact_name(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Whether a direct edge exists; transitive paths are not considered.
    pub fn edge_exists(&self, from: usize, to: usize) -> bool {
        self.edges_out[from].iter().any(|&(target, _)| target == to)
    }

    /// Whether a directed path from `from` to `to` exists.
    ///
    /// Searches with a forward frontier from `from` and a reverse frontier
    /// from `to`, advancing one step each in turn until they meet. Every
    /// discovered forward descendant and reverse ancestor is recorded in
    /// the paths cache, so even negative queries grow the cache.
    pub fn path_exists(&mut self, from: usize, to: usize) -> bool {
        if self.paths_cache.is_path_cached(from, to) {
            return true;
        }

        let mut forward_queue = VecDeque::from([from]);
        let mut reverse_queue = VecDeque::from([to]);
        let mut forward_visited = HashSet::from([from]);
        let mut reverse_visited = HashSet::from([to]);

        while !forward_queue.is_empty() && !reverse_queue.is_empty() {
            if let Some(vertex) = forward_queue.pop_front() {
                if vertex == to || reverse_visited.contains(&vertex) {
                    return true;
                }
                for &(successor, _) in &self.edges_out[vertex] {
                    if forward_visited.insert(successor) {
                        self.paths_cache.cache_path(from, successor);
                        forward_queue.push_back(successor);
                    }
                }
            }

            if let Some(vertex) = reverse_queue.pop_front() {
                if vertex == from || forward_visited.contains(&vertex) {
                    return true;
                }
                for &predecessor in &self.edges_in[vertex] {
                    if reverse_visited.insert(predecessor) {
                        self.paths_cache.cache_path(predecessor, to);
                        reverse_queue.push_back(predecessor);
                    }
                }
            }
        }

        false
    }

    /// Add an edge, unless `to` is already cached as reachable from `from`.
    pub fn add_edge(&mut self, from: usize, to: usize, edge_type: EdgeType) {
        if self.paths_cache.is_path_cached(from, to) {
            return;
        }

        debug!(
            "Adding {} edge from \"{}\" to \"{}\".",
            edge_type,
            self.vertices[from].name(),
            self.vertices[to].name()
        );

        self.edges_out[from].push((to, edge_type));
        self.edges_in[to].push(from);
        self.paths_cache.cache_path(from, to);
    }

    /// Add edges for master flags, declared masters, requirements and
    /// load-after metadata.
    pub fn add_specific_edges(&mut self) {
        trace!("Adding edges based on plugin data and non-group metadata...");

        for vertex in 0..self.vertices.len() {
            for other in vertex + 1..self.vertices.len() {
                if self.vertices[vertex].is_master() == self.vertices[other].is_master() {
                    continue;
                }

                let (parent, child) = if self.vertices[other].is_master() {
                    (other, vertex)
                } else {
                    (vertex, other)
                };

                self.add_edge(parent, child, EdgeType::MasterFlag);
            }

            let masters = self.vertices[vertex].masters().to_vec();
            for master in masters {
                if let Some(parent) = self.vertex_by_name(&master) {
                    self.add_edge(parent, vertex, EdgeType::Master);
                }
            }

            let metadata_parents: Vec<(String, EdgeType)> = {
                let plugin = &self.vertices[vertex];
                let entries = |files: &[crate::metadata::File], edge_type: EdgeType| {
                    files
                        .iter()
                        .map(|file| (file.name().as_str().to_string(), edge_type))
                        .collect::<Vec<_>>()
                };

                [
                    entries(plugin.masterlist_requirements(), EdgeType::MasterlistRequirement),
                    entries(plugin.user_requirements(), EdgeType::UserRequirement),
                    entries(plugin.masterlist_load_after(), EdgeType::MasterlistLoadAfter),
                    entries(plugin.user_load_after(), EdgeType::UserLoadAfter),
                ]
                .concat()
            };

            for (name, edge_type) in metadata_parents {
                if let Some(parent) = self.vertex_by_name(&name) {
                    self.add_edge(parent, vertex, edge_type);
                }
            }
        }
    }

    /// Add edges from implicitly active plugins to everything without a
    /// hardcoded position.
    pub fn add_hardcoded_plugin_edges(&mut self, hardcoded_plugins: &[String], game_type: GameType) {
        trace!(
            "Adding edges for implicitly active plugins and plugins with hardcoded positions..."
        );

        let hardcoded_names: HashSet<String> = hardcoded_plugins
            .iter()
            .map(|name| normalize_filename(name))
            .collect();

        for hardcoded_plugin in hardcoded_plugins {
            if game_type == GameType::Tes5
                && compare_filenames(hardcoded_plugin, "Update.esm") == Ordering::Equal
            {
                debug!(
                    "Skipping adding hardcoded plugin edges for Update.esm as it does not have \
                     a hardcoded position for Skyrim."
                );
                continue;
            }

            let Some(plugin_vertex) = self.vertex_by_name(hardcoded_plugin) else {
                debug!(
                    "Skipping adding hardcoded plugin edges for \"{}\" as it has not been \
                     loaded.",
                    hardcoded_plugin
                );
                continue;
            };

            for vertex in 0..self.vertices.len() {
                if vertex == plugin_vertex {
                    continue;
                }

                if !hardcoded_names.contains(&self.normalized_names[vertex]) {
                    self.add_edge(plugin_vertex, vertex, EdgeType::Hardcoded);
                }
            }
        }
    }

    /// Add edges derived from group memberships.
    ///
    /// Candidate edges that would close a cycle are skipped. When the
    /// default-group plugin on such a cycle can be identified, its group
    /// membership is ignored for all groups on the paths between the two
    /// plugins' groups, since the default group is only a fallback for
    /// plugins without explicit metadata.
    pub fn add_group_edges(
        &mut self,
        groups: &IndexMap<String, Group>,
    ) -> Result<(), SortError> {
        trace!("Adding edges based on plugin group memberships...");

        let mut acyclic_edge_pairs: Vec<(usize, usize)> = Vec::new();
        let mut group_plugins_to_ignore: HashMap<String, HashSet<String>> = HashMap::new();

        for vertex in 0..self.vertices.len() {
            let predecessors = self.vertices[vertex].predecessor_group_plugins().to_vec();

            for predecessor in predecessors {
                // Predecessor names are taken from other sorting data
                // entries, so exact lookups suffice.
                let Some(parent) = self.vertex_by_exact_name(&predecessor.name) else {
                    continue;
                };

                if !self.path_exists(vertex, parent) {
                    acyclic_edge_pairs.push((parent, vertex));
                    continue;
                }

                debug!(
                    "Skipping group edge from \"{}\" to \"{}\" as it would create a cycle.",
                    self.vertices[parent].name(),
                    self.vertices[vertex].name()
                );

                // If the earlier plugin is not a master and the later one
                // is, the master-flag edge dominates whatever the groups
                // say; any non-master on the path gets its own cycle
                // handled separately.
                if !self.vertices[parent].is_master() && self.vertices[vertex].is_master() {
                    continue;
                }

                let plugin_to_ignore = if self.vertices[vertex].group() == Group::DEFAULT_NAME {
                    self.vertices[vertex].name().to_string()
                } else if self.vertices[parent].group() == Group::DEFAULT_NAME {
                    self.vertices[parent].name().to_string()
                } else {
                    // With neither plugin in the default group there is no
                    // principled choice of which membership to ignore.
                    debug!(
                        "Cannot ignore either plugin's group membership: neither \"{}\" nor \
                         \"{}\" is in the default group.",
                        self.vertices[parent].name(),
                        self.vertices[vertex].name()
                    );
                    continue;
                };

                let groups_in_paths = find_groups_in_all_paths(
                    groups,
                    self.vertices[parent].group(),
                    self.vertices[vertex].group(),
                )?;

                ignore_plugin_group_edges(
                    plugin_to_ignore,
                    groups_in_paths,
                    &mut group_plugins_to_ignore,
                );
            }
        }

        for (from, to) in acyclic_edge_pairs {
            let ignore = should_ignore_group_edge(
                &self.vertices[from],
                &self.vertices[to],
                &group_plugins_to_ignore,
            );

            if !ignore {
                self.add_edge(from, to, EdgeType::Group);
            } else {
                debug!(
                    "Skipping group edge from \"{}\" to \"{}\" as it would create a multi-group \
                     cycle.",
                    self.vertices[from].name(),
                    self.vertices[to].name()
                );
            }
        }

        Ok(())
    }

    /// Add edges between overlapping plugins: the plugin overriding more
    /// records loads first; if override counts are equal or records don't
    /// overlap, the plugin loading more assets loads first.
    pub fn add_overlap_edges(&mut self) -> Result<(), SortError> {
        trace!("Adding edges for overlapping plugins...");

        for vertex in 0..self.vertices.len() {
            let record_count = self.vertices[vertex].override_record_count();
            let asset_count = self.vertices[vertex].asset_count();

            if record_count == 0 && asset_count == 0 {
                debug!(
                    "Skipping vertex for \"{}\": the plugin contains no override records and \
                     loads no assets.",
                    self.vertices[vertex].name()
                );
                continue;
            }

            for other in vertex + 1..self.vertices.len() {
                // Only direct edges are checked here; a path between the
                // two plugins is tolerated until the edge direction is
                // known.
                if self.edge_exists(vertex, other) || self.edge_exists(other, vertex) {
                    continue;
                }

                let other_record_count = self.vertices[other].override_record_count();

                let this_plugin_loads_first = if record_count == other_record_count
                    || !self.vertices[vertex].records_overlap(&self.vertices[other])?
                {
                    // Records don't overlap or tie; fall back to assets.
                    let other_asset_count = self.vertices[other].asset_count();
                    if asset_count == other_asset_count
                        || !self.vertices[vertex].assets_overlap(&self.vertices[other])?
                    {
                        continue;
                    }

                    asset_count > other_asset_count
                } else {
                    record_count > other_record_count
                };

                let (from, to) = if this_plugin_loads_first {
                    (vertex, other)
                } else {
                    (other, vertex)
                };

                if !self.path_exists(to, from) {
                    self.add_edge(from, to, EdgeType::Overlap);
                }
            }
        }

        Ok(())
    }

    /// Add edges between all remaining unordered pairs so the sort result
    /// is unique.
    pub fn add_tie_break_edges(&mut self) {
        trace!("Adding edges to break ties between plugins...");

        for vertex in 0..self.vertices.len() {
            for other in vertex + 1..self.vertices.len() {
                let this_plugin_loads_first =
                    compare_plugins(&self.vertices[vertex], &self.vertices[other])
                        == Ordering::Less;

                let (from, to) = if this_plugin_loads_first {
                    (vertex, other)
                } else {
                    (other, vertex)
                };

                if !self.path_exists(to, from) {
                    self.add_edge(from, to, EdgeType::TieBreak);
                }
            }
        }
    }

    /// Search for a directed cycle, reporting the vertices and edge types
    /// on it.
    ///
    /// The search records a trail of tree edges, truncating it when the
    /// traversal jumps to an earlier branch; a back edge closes a cycle and
    /// the trail from the cycle's entry point onwards is the diagnostic.
    pub fn check_for_cycles(&self) -> Result<(), SortError> {
        trace!("Checking plugin graph for cycles...");

        let mut color = vec![Color::White; self.vertices.len()];
        let mut trail: Vec<Vertex> = Vec::new();

        for root in 0..self.vertices.len() {
            if color[root] != Color::White {
                continue;
            }

            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            color[root] = Color::Grey;

            while let Some(frame) = stack.last_mut() {
                let (vertex, edge_index) = *frame;

                if edge_index >= self.edges_out[vertex].len() {
                    color[vertex] = Color::Black;
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let (target, edge_type) = self.edges_out[vertex][edge_index];
                let source_name = self.vertices[vertex].name();

                match color[target] {
                    Color::White => {
                        if let Some(position) =
                            trail.iter().position(|v| v.name() == source_name)
                        {
                            // The trail beyond this vertex belonged to a
                            // sibling branch and cannot be part of a cycle
                            // through this edge.
                            trail.truncate(position);
                        }
                        trail.push(Vertex::new(source_name, edge_type));

                        color[target] = Color::Grey;
                        stack.push((target, 0));
                    }
                    Color::Grey => {
                        trail.push(Vertex::new(source_name, edge_type));

                        let target_name = self.vertices[target].name();
                        if let Some(position) =
                            trail.iter().position(|v| v.name() == target_name)
                        {
                            return Err(SortError::CyclicInteraction(
                                trail[position..].to_vec(),
                            ));
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        Ok(())
    }

    /// Emit a linearisation compatible with the edge set.
    pub fn topological_sort(&self) -> Vec<usize> {
        trace!("Performing topological sort on plugin graph...");

        let mut color = vec![Color::White; self.vertices.len()];
        let mut reverse_order: Vec<usize> = Vec::with_capacity(self.vertices.len());

        for root in 0..self.vertices.len() {
            if color[root] != Color::White {
                continue;
            }

            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            color[root] = Color::Grey;

            while let Some(frame) = stack.last_mut() {
                let (vertex, edge_index) = *frame;

                if edge_index >= self.edges_out[vertex].len() {
                    color[vertex] = Color::Black;
                    reverse_order.push(vertex);
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let (target, _) = self.edges_out[vertex][edge_index];
                if color[target] == Color::White {
                    color[target] = Color::Grey;
                    stack.push((target, 0));
                }
            }
        }

        reverse_order.reverse();
        reverse_order
    }

    /// Whether every consecutive pair in `path` is joined by a direct edge.
    /// Returns the first pair that is not, if any.
    pub fn is_hamiltonian_path(&self, path: &[usize]) -> Option<(usize, usize)> {
        trace!("Checking uniqueness of path through plugin graph...");

        path.windows(2)
            .find(|pair| !self.edge_exists(pair[0], pair[1]))
            .map(|pair| (pair[0], pair[1]))
    }

    /// Map a vertex path back to plugin names.
    pub fn to_plugin_names(&self, path: &[usize]) -> Vec<String> {
        path.iter()
            .map(|&vertex| self.vertices[vertex].name().to_string())
            .collect()
    }
}

impl<'a> Default for PluginGraph<'a> {
    fn default() -> Self {
        Self::new()
    }
}
