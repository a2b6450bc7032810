//! Shared test fixtures: an in-memory plugin double and helpers for
//! building sorting views without touching real plugin files.

// Each test binary compiles this module separately and uses a different
// subset of it.
#![allow(dead_code)]

use std::any::Any;
use std::collections::HashSet;

use loadsort::error::SortError;
use loadsort::filename::normalize_filename;
use loadsort::metadata::{PluginMetadata, Tag};
use loadsort::plugin::PluginProvider;
use loadsort::{GameType, PluginSortingData};

/// A plugin whose every property is set directly by the test.
///
/// Overlap relationships are symmetric: registering an overlap on either
/// side is enough.
#[derive(Debug, Default)]
pub struct TestPlugin {
    name: String,
    masters: Vec<String>,
    is_master: bool,
    is_light: bool,
    is_blueprint: bool,
    override_record_count: usize,
    record_and_group_count: u32,
    asset_count: usize,
    records_overlap_with: HashSet<String>,
    assets_overlap_with: HashSet<String>,
}

impl TestPlugin {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_masters(mut self, masters: &[&str]) -> Self {
        self.masters = masters.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn as_master(mut self) -> Self {
        self.is_master = true;
        self
    }

    pub fn as_light(mut self) -> Self {
        self.is_light = true;
        self
    }

    pub fn as_blueprint(mut self) -> Self {
        self.is_blueprint = true;
        self
    }

    pub fn with_override_record_count(mut self, count: usize) -> Self {
        self.override_record_count = count;
        self
    }

    pub fn with_record_and_group_count(mut self, count: u32) -> Self {
        self.record_and_group_count = count;
        self
    }

    pub fn with_asset_count(mut self, count: usize) -> Self {
        self.asset_count = count;
        self
    }

    pub fn overlapping_records_with(mut self, name: &str) -> Self {
        self.records_overlap_with.insert(normalize_filename(name));
        self
    }

    pub fn overlapping_assets_with(mut self, name: &str) -> Self {
        self.assets_overlap_with.insert(normalize_filename(name));
        self
    }

    fn downcast<'o>(&self, other: &'o dyn PluginProvider) -> Result<&'o TestPlugin, SortError> {
        other.as_any().downcast_ref::<TestPlugin>().ok_or_else(|| {
            SortError::InvalidArgument(
                "tried to compare a plugin against a non-plugin object".to_string(),
            )
        })
    }
}

impl PluginProvider for TestPlugin {
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
        self.is_blueprint
    }

    fn is_valid_as_light_plugin(&self) -> bool {
        self.is_light
    }

    fn is_valid_as_medium_plugin(&self) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn loads_archive(&self) -> bool {
        self.asset_count > 0
    }

    fn override_record_count(&self) -> Result<usize, SortError> {
        Ok(self.override_record_count)
    }

    fn record_and_group_count(&self) -> u32 {
        self.record_and_group_count
    }

    fn records_overlap(&self, other: &dyn PluginProvider) -> Result<bool, SortError> {
        let other = self.downcast(other)?;
        Ok(self
            .records_overlap_with
            .contains(&normalize_filename(&other.name))
            || other
                .records_overlap_with
                .contains(&normalize_filename(&self.name)))
    }

    fn overlap_size(&self, others: &[&dyn PluginProvider]) -> Result<usize, SortError> {
        let mut size = 0;
        for other in others {
            if self.records_overlap(*other)? {
                size += 1;
            }
        }
        Ok(size)
    }

    fn asset_count(&self) -> usize {
        self.asset_count
    }

    fn assets_overlap(&self, other: &dyn PluginProvider) -> Result<bool, SortError> {
        let other = self.downcast(other)?;
        Ok(self
            .assets_overlap_with
            .contains(&normalize_filename(&other.name))
            || other
                .assets_overlap_with
                .contains(&normalize_filename(&self.name)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn empty_metadata(name: &str) -> PluginMetadata {
    PluginMetadata::new(name).unwrap()
}

/// Build a sorting view with no metadata and no current load order.
pub fn sorting_data(plugin: &TestPlugin) -> PluginSortingData<'_> {
    sorting_data_with(plugin, None, None, &[])
}

/// Build a sorting view with the given metadata and current load order.
pub fn sorting_data_with<'a>(
    plugin: &'a TestPlugin,
    masterlist_metadata: Option<PluginMetadata>,
    user_metadata: Option<PluginMetadata>,
    load_order: &[String],
) -> PluginSortingData<'a> {
    let masterlist = masterlist_metadata.unwrap_or_else(|| empty_metadata(plugin.name()));
    let user = user_metadata.unwrap_or_else(|| empty_metadata(plugin.name()));

    PluginSortingData::new(plugin, &masterlist, &user, load_order, GameType::Tes4, &[]).unwrap()
}
