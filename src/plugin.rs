//! The interface the sorting engine uses to query parsed plugins.

use std::any::Any;

use crate::error::SortError;
use crate::metadata::Tag;

/// Read access to a parsed plugin file.
///
/// The sorting engine never reads plugin binaries itself; it consumes them
/// through this capability set, implemented once per engine generation by
/// the parsing layer. Operations that touch plugin contents can fail with
/// [`SortError::PluginParse`] or [`SortError::FileAccess`], which sorting
/// surfaces to callers unchanged.
///
/// Overlap queries compare two plugins' record or asset sets. An
/// implementation may only be able to compare against plugins from the same
/// parser; handed anything else (via [`as_any`](PluginProvider::as_any)
/// downcasting), it should return [`SortError::InvalidArgument`].
pub trait PluginProvider {
    /// The plugin's filename, without any `.ghost` suffix unless the game
    /// keeps it.
    fn name(&self) -> &str;

    /// The version read from the plugin header, if present.
    fn header_version(&self) -> Option<f32>;

    /// The version string found in the plugin's description field, if any.
    fn version(&self) -> Option<String>;

    /// The filenames of the masters this plugin declares, in declaration
    /// order.
    fn masters(&self) -> Result<Vec<String>, SortError>;

    /// Bash Tags suggested by the plugin's description field.
    fn bash_tags(&self) -> Vec<Tag>;

    /// The CRC-32 of the plugin file's contents, if it has been computed.
    fn crc(&self) -> Option<u32>;

    fn is_master(&self) -> bool;

    fn is_light_plugin(&self) -> bool;

    fn is_medium_plugin(&self) -> bool;

    fn is_blueprint_plugin(&self) -> bool;

    fn is_valid_as_light_plugin(&self) -> bool;

    fn is_valid_as_medium_plugin(&self) -> bool;

    fn is_empty(&self) -> bool;

    /// Whether an asset archive is associated with this plugin.
    fn loads_archive(&self) -> bool;

    /// The number of records this plugin overrides from its masters.
    fn override_record_count(&self) -> Result<usize, SortError>;

    /// The total number of records and groups in the plugin.
    fn record_and_group_count(&self) -> u32;

    /// Whether this plugin and `other` override any of the same records.
    fn records_overlap(&self, other: &dyn PluginProvider) -> Result<bool, SortError>;

    /// The number of this plugin's records that also appear in the given
    /// plugins. Used for games whose plugins don't flag overrides directly.
    fn overlap_size(&self, others: &[&dyn PluginProvider]) -> Result<usize, SortError>;

    /// The number of assets loaded from this plugin's associated archives.
    fn asset_count(&self) -> usize;

    /// Whether this plugin and `other` load assets at any of the same paths.
    fn assets_overlap(&self, other: &dyn PluginProvider) -> Result<bool, SortError>;

    /// Downcast support for overlap queries between plugins of the same
    /// concrete type.
    fn as_any(&self) -> &dyn Any;
}
