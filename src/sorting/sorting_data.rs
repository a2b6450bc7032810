//! The per-plugin view the sorting graphs operate on.

use std::cmp::Ordering;

use crate::error::SortError;
use crate::filename::compare_filenames;
use crate::game::GameType;
use crate::metadata::{File, Group, PluginMetadata};
use crate::plugin::PluginProvider;

/// A plugin that belongs to a group loading before another plugin's group,
/// with a flag recording whether user metadata is involved in the
/// relationship.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PredecessorGroupPlugin {
    pub name: String,
    pub path_involves_user_metadata: bool,
}

/// A read-only façade over one plugin for the duration of a sort, combining
/// the parsed plugin with its masterlist and user metadata.
///
/// Everything that can be resolved once is resolved at construction; only
/// the overlap queries go back to the parser during the sort.
pub struct PluginSortingData<'a> {
    plugin: &'a dyn PluginProvider,
    name: String,
    is_master: bool,
    is_blueprint_master: bool,
    masters: Vec<String>,
    override_record_count: usize,
    asset_count: usize,
    group: String,
    group_is_user_metadata: bool,
    masterlist_load_after: Vec<File>,
    user_load_after: Vec<File>,
    masterlist_requirements: Vec<File>,
    user_requirements: Vec<File>,
    load_order_index: Option<usize>,
    predecessor_group_plugins: Vec<PredecessorGroupPlugin>,
}

impl<'a> PluginSortingData<'a> {
    /// Build the sorting view of a plugin.
    ///
    /// For Morrowind and OpenMW the override record count is derived from
    /// the overlap between the plugin and its masters, because their plugin
    /// format does not flag overrides; if any master is missing from the
    /// loaded set, the plugin's total record and group count is used
    /// instead.
    pub fn new(
        plugin: &'a dyn PluginProvider,
        masterlist_metadata: &PluginMetadata,
        user_metadata: &PluginMetadata,
        load_order: &[String],
        game_type: GameType,
        loaded_plugins: &[&dyn PluginProvider],
    ) -> Result<Self, SortError> {
        let name = plugin.name().to_string();
        let masters = plugin.masters()?;

        let is_master =
            plugin.is_master() || (plugin.is_light_plugin() && !has_esp_extension(&name));
        let is_blueprint_master = is_master && plugin.is_blueprint_plugin();

        let override_record_count = if game_type.derives_override_counts_from_masters() {
            let loaded_masters: Vec<&dyn PluginProvider> = masters
                .iter()
                .filter_map(|master| {
                    loaded_plugins
                        .iter()
                        .find(|loaded| {
                            compare_filenames(loaded.name(), master) == Ordering::Equal
                        })
                        .copied()
                })
                .collect();

            if loaded_masters.len() == masters.len() {
                plugin.overlap_size(&loaded_masters)?
            } else {
                plugin.record_and_group_count() as usize
            }
        } else {
            plugin.override_record_count()?
        };

        let group = user_metadata
            .group()
            .or_else(|| masterlist_metadata.group())
            .unwrap_or(Group::DEFAULT_NAME)
            .to_string();

        let load_order_index = load_order
            .iter()
            .position(|entry| compare_filenames(entry, &name) == Ordering::Equal);

        Ok(Self {
            name,
            is_master,
            is_blueprint_master,
            masters,
            override_record_count,
            asset_count: plugin.asset_count(),
            group,
            group_is_user_metadata: user_metadata.group().is_some(),
            masterlist_load_after: masterlist_metadata.load_after_files().to_vec(),
            user_load_after: user_metadata.load_after_files().to_vec(),
            masterlist_requirements: masterlist_metadata.requirements().to_vec(),
            user_requirements: user_metadata.requirements().to_vec(),
            load_order_index,
            predecessor_group_plugins: Vec::new(),
            plugin,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn is_blueprint_master(&self) -> bool {
        self.is_blueprint_master
    }

    /// The masters declared in the plugin header, in declaration order.
    pub fn masters(&self) -> &[String] {
        &self.masters
    }

    pub fn override_record_count(&self) -> usize {
        self.override_record_count
    }

    pub fn asset_count(&self) -> usize {
        self.asset_count
    }

    /// The resolved group name: user metadata wins over the masterlist,
    /// which wins over the implicit default.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Whether the resolved group came from user metadata.
    pub fn group_is_user_metadata(&self) -> bool {
        self.group_is_user_metadata
    }

    pub fn masterlist_load_after(&self) -> &[File] {
        &self.masterlist_load_after
    }

    pub fn user_load_after(&self) -> &[File] {
        &self.user_load_after
    }

    pub fn masterlist_requirements(&self) -> &[File] {
        &self.masterlist_requirements
    }

    pub fn user_requirements(&self) -> &[File] {
        &self.user_requirements
    }

    /// The plugin's position in the current load order, if it is in it.
    pub fn load_order_index(&self) -> Option<usize> {
        self.load_order_index
    }

    /// The plugins in groups that load before this plugin's group.
    pub fn predecessor_group_plugins(&self) -> &[PredecessorGroupPlugin] {
        &self.predecessor_group_plugins
    }

    /// Install the group-graph expansion for this plugin, sorted for
    /// deterministic iteration.
    pub fn set_predecessor_group_plugins(&mut self, mut plugins: Vec<PredecessorGroupPlugin>) {
        plugins.sort();
        self.predecessor_group_plugins = plugins;
    }

    /// Whether this plugin and `other` override any of the same records.
    pub fn records_overlap(&self, other: &PluginSortingData<'_>) -> Result<bool, SortError> {
        self.plugin.records_overlap(other.plugin)
    }

    /// Whether this plugin and `other` load assets at any of the same
    /// paths.
    pub fn assets_overlap(&self, other: &PluginSortingData<'_>) -> Result<bool, SortError> {
        self.plugin.assets_overlap(other.plugin)
    }
}

/// Whether the filename ends in `.esp`, which excludes a light plugin from
/// being treated as a master.
fn has_esp_extension(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".esp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::BTreeSet;

    use crate::metadata::Tag;

    #[derive(Default)]
    struct FakePlugin {
        name: String,
        masters: Vec<String>,
        is_master: bool,
        is_light: bool,
        override_record_count: usize,
        record_and_group_count: u32,
        overlap_sizes: BTreeSet<String>,
    }

    impl FakePlugin {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                ..Default::default()
            }
        }
    }

    impl PluginProvider for FakePlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn header_version(&self) -> Option<f32> {
            None
        }

        fn version(&self) -> Option<String> {
            None
        }

        fn masters(&self) -> Result<Vec<String>, SortError> {
            Ok(self.masters.clone())
        }

        fn bash_tags(&self) -> Vec<Tag> {
            Vec::new()
        }

        fn crc(&self) -> Option<u32> {
            None
        }

        fn is_master(&self) -> bool {
            self.is_master
        }

        fn is_light_plugin(&self) -> bool {
            self.is_light
        }

        fn is_medium_plugin(&self) -> bool {
            false
        }

        fn is_blueprint_plugin(&self) -> bool {
            false
        }

        fn is_valid_as_light_plugin(&self) -> bool {
            false
        }

        fn is_valid_as_medium_plugin(&self) -> bool {
            false
        }

        fn is_empty(&self) -> bool {
            false
        }

        fn loads_archive(&self) -> bool {
            false
        }

        fn override_record_count(&self) -> Result<usize, SortError> {
            Ok(self.override_record_count)
        }

        fn record_and_group_count(&self) -> u32 {
            self.record_and_group_count
        }

        fn records_overlap(&self, _other: &dyn PluginProvider) -> Result<bool, SortError> {
            Ok(false)
        }

        fn overlap_size(&self, others: &[&dyn PluginProvider]) -> Result<usize, SortError> {
            Ok(others
                .iter()
                .filter(|other| self.overlap_sizes.contains(other.name()))
                .count())
        }

        fn asset_count(&self) -> usize {
            0
        }

        fn assets_overlap(&self, _other: &dyn PluginProvider) -> Result<bool, SortError> {
            Ok(false)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn empty_metadata(name: &str) -> PluginMetadata {
        PluginMetadata::new(name).unwrap()
    }

    #[test]
    fn test_light_plugin_not_ending_in_esp_is_a_master() {
        let mut plugin = FakePlugin::new("small.esl");
        plugin.is_light = true;

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("small.esl"),
            &empty_metadata("small.esl"),
            &[],
            GameType::Tes5se,
            &[],
        )
        .unwrap();

        assert!(data.is_master());
    }

    #[test]
    fn test_light_plugin_ending_in_esp_is_not_a_master() {
        let mut plugin = FakePlugin::new("small.esp");
        plugin.is_light = true;

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("small.esp"),
            &empty_metadata("small.esp"),
            &[],
            GameType::Tes5se,
            &[],
        )
        .unwrap();

        assert!(!data.is_master());
    }

    #[test]
    fn test_group_resolution_prefers_user_metadata() {
        let plugin = FakePlugin::new("a.esp");
        let mut masterlist = empty_metadata("a.esp");
        masterlist.set_group("from-masterlist");
        let mut user = empty_metadata("a.esp");
        user.set_group("from-user");

        let data = PluginSortingData::new(
            &plugin,
            &masterlist,
            &user,
            &[],
            GameType::Tes5,
            &[],
        )
        .unwrap();

        assert_eq!(data.group(), "from-user");
        assert!(data.group_is_user_metadata());

        let data = PluginSortingData::new(
            &plugin,
            &masterlist,
            &empty_metadata("a.esp"),
            &[],
            GameType::Tes5,
            &[],
        )
        .unwrap();

        assert_eq!(data.group(), "from-masterlist");
        assert!(!data.group_is_user_metadata());

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("a.esp"),
            &empty_metadata("a.esp"),
            &[],
            GameType::Tes5,
            &[],
        )
        .unwrap();

        assert_eq!(data.group(), Group::DEFAULT_NAME);
    }

    #[test]
    fn test_load_order_index_uses_filename_comparison() {
        let plugin = FakePlugin::new("B.esp");
        let load_order = vec!["a.esp".to_string(), "b.ESP".to_string()];

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("B.esp"),
            &empty_metadata("B.esp"),
            &load_order,
            GameType::Tes5,
            &[],
        )
        .unwrap();

        assert_eq!(data.load_order_index(), Some(1));

        let absent = FakePlugin::new("c.esp");
        let data = PluginSortingData::new(
            &absent,
            &empty_metadata("c.esp"),
            &empty_metadata("c.esp"),
            &load_order,
            GameType::Tes5,
            &[],
        )
        .unwrap();

        assert_eq!(data.load_order_index(), None);
    }

    #[test]
    fn test_morrowind_override_count_uses_overlap_with_masters() {
        let master_a = FakePlugin::new("a.esm");
        let master_b = FakePlugin::new("b.esm");

        let mut plugin = FakePlugin::new("c.esp");
        plugin.masters = vec!["a.esm".to_string(), "b.esm".to_string()];
        plugin.overlap_sizes.insert("a.esm".to_string());
        plugin.overlap_sizes.insert("b.esm".to_string());
        plugin.record_and_group_count = 100;

        let loaded: Vec<&dyn PluginProvider> = vec![&master_a, &master_b];

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("c.esp"),
            &empty_metadata("c.esp"),
            &[],
            GameType::Tes3,
            &loaded,
        )
        .unwrap();

        assert_eq!(data.override_record_count(), 2);
    }

    #[test]
    fn test_morrowind_override_count_falls_back_when_master_missing() {
        let master_a = FakePlugin::new("a.esm");

        let mut plugin = FakePlugin::new("c.esp");
        plugin.masters = vec!["a.esm".to_string(), "missing.esm".to_string()];
        plugin.record_and_group_count = 100;

        let loaded: Vec<&dyn PluginProvider> = vec![&master_a];

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("c.esp"),
            &empty_metadata("c.esp"),
            &[],
            GameType::Openmw,
            &loaded,
        )
        .unwrap();

        assert_eq!(data.override_record_count(), 100);
    }

    #[test]
    fn test_other_games_read_override_count_from_parser() {
        let mut plugin = FakePlugin::new("a.esp");
        plugin.override_record_count = 7;

        let data = PluginSortingData::new(
            &plugin,
            &empty_metadata("a.esp"),
            &empty_metadata("a.esp"),
            &[],
            GameType::Tes5se,
            &[],
        )
        .unwrap();

        assert_eq!(data.override_record_count(), 7);
    }
}
