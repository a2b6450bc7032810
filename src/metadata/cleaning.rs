//! Plugin cleaning data.

use serde::{Deserialize, Serialize};

/// Identifies a specific version of a plugin (by CRC) as dirty or clean,
/// with the utility that produced the verdict and the counts it reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCleaningData {
    crc: u32,
    cleaning_utility: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(default)]
    itm_count: u32,
    #[serde(default)]
    deleted_reference_count: u32,
    #[serde(default)]
    deleted_navmesh_count: u32,
}

impl PluginCleaningData {
    pub fn new(crc: u32, cleaning_utility: impl Into<String>) -> Self {
        Self {
            crc,
            cleaning_utility: cleaning_utility.into(),
            detail: None,
            itm_count: 0,
            deleted_reference_count: 0,
            deleted_navmesh_count: 0,
        }
    }

    pub fn with_counts(mut self, itm: u32, deleted_references: u32, deleted_navmeshes: u32) -> Self {
        self.itm_count = itm;
        self.deleted_reference_count = deleted_references;
        self.deleted_navmesh_count = deleted_navmeshes;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The CRC-32 of the plugin version this data applies to.
    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn cleaning_utility(&self) -> &str {
        &self.cleaning_utility
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Identical To Master record count.
    pub fn itm_count(&self) -> u32 {
        self.itm_count
    }

    pub fn deleted_reference_count(&self) -> u32 {
        self.deleted_reference_count
    }

    pub fn deleted_navmesh_count(&self) -> u32 {
        self.deleted_navmesh_count
    }
}
