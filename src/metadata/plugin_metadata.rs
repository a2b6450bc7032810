//! Per-plugin metadata and merge semantics.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use crate::error::SortError;
use crate::filename::compare_filenames;
use crate::metadata::{File, Location, Message, PluginCleaningData, Tag};

/// Characters that mark a metadata entry's name as a regular expression
/// rather than a literal filename.
const REGEX_CHARACTERS: [char; 5] = [':', '\\', '*', '?', '|'];

/// The metadata attached to one plugin name, from the masterlist or from
/// user overrides.
///
/// A metadata entry's name may be a regular expression, in which case it
/// applies to every installed plugin the expression matches.
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    name: String,
    name_regex: Option<Regex>,
    group: Option<String>,
    load_after: Vec<File>,
    requirements: Vec<File>,
    incompatibilities: Vec<File>,
    messages: Vec<Message>,
    tags: Vec<Tag>,
    dirty_info: Vec<PluginCleaningData>,
    clean_info: Vec<PluginCleaningData>,
    locations: Vec<Location>,
}

impl PluginMetadata {
    /// Create an empty metadata entry for the given plugin name.
    ///
    /// Fails with [`SortError::InvalidArgument`] if the name looks like a
    /// regular expression but does not compile as one.
    pub fn new(name: &str) -> Result<Self, SortError> {
        let name_regex = if name.contains(&REGEX_CHARACTERS[..]) {
            // Anchored so the expression must match the whole plugin name.
            let regex = RegexBuilder::new(&format!("^(?:{})$", name))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    SortError::InvalidArgument(format!(
                        "invalid regex plugin name \"{}\": {}",
                        name, e
                    ))
                })?;
            Some(regex)
        } else {
            None
        };

        Ok(Self {
            name: name.to_string(),
            name_regex,
            group: None,
            load_after: Vec::new(),
            requirements: Vec::new(),
            incompatibilities: Vec::new(),
            messages: Vec::new(),
            tags: Vec::new(),
            dirty_info: Vec::new(),
            clean_info: Vec::new(),
            locations: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this entry's name is a regular expression.
    pub fn is_regex_name(&self) -> bool {
        self.name_regex.is_some()
    }

    /// Whether the given literal plugin name is covered by this entry.
    ///
    /// Regex names are matched against the whole query; literal names are
    /// compared case-insensitively as filenames.
    pub fn name_matches(&self, plugin_name: &str) -> bool {
        match &self.name_regex {
            Some(regex) => regex.is_match(plugin_name),
            None => compare_filenames(&self.name, plugin_name) == Ordering::Equal,
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = Some(group.into());
    }

    pub fn unset_group(&mut self) {
        self.group = None;
    }

    pub fn load_after_files(&self) -> &[File] {
        &self.load_after
    }

    pub fn set_load_after_files(&mut self, load_after: Vec<File>) {
        self.load_after = load_after;
    }

    pub fn requirements(&self) -> &[File] {
        &self.requirements
    }

    pub fn set_requirements(&mut self, requirements: Vec<File>) {
        self.requirements = requirements;
    }

    pub fn incompatibilities(&self) -> &[File] {
        &self.incompatibilities
    }

    pub fn set_incompatibilities(&mut self, incompatibilities: Vec<File>) {
        self.incompatibilities = incompatibilities;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }

    pub fn dirty_info(&self) -> &[PluginCleaningData] {
        &self.dirty_info
    }

    pub fn set_dirty_info(&mut self, dirty_info: Vec<PluginCleaningData>) {
        self.dirty_info = dirty_info;
    }

    pub fn clean_info(&self) -> &[PluginCleaningData] {
        &self.clean_info
    }

    pub fn set_clean_info(&mut self, clean_info: Vec<PluginCleaningData>) {
        self.clean_info = clean_info;
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn set_locations(&mut self, locations: Vec<Location>) {
        self.locations = locations;
    }

    /// Merge another entry's metadata into this one.
    ///
    /// Container fields are unioned: elements of `other` that are not
    /// already present are appended in their original order. The group is
    /// replaced only if `other` set one explicitly.
    pub fn merge(&mut self, other: &PluginMetadata) {
        if other.group.is_some() {
            self.group = other.group.clone();
        }

        merge_into(&mut self.load_after, &other.load_after);
        merge_into(&mut self.requirements, &other.requirements);
        merge_into(&mut self.incompatibilities, &other.incompatibilities);
        merge_into(&mut self.messages, &other.messages);
        merge_into(&mut self.tags, &other.tags);
        merge_into(&mut self.dirty_info, &other.dirty_info);
        merge_into(&mut self.clean_info, &other.clean_info);
        merge_into(&mut self.locations, &other.locations);
    }

    /// Whether this entry carries no metadata beyond its name.
    pub fn has_name_only(&self) -> bool {
        self.group.is_none()
            && self.load_after.is_empty()
            && self.requirements.is_empty()
            && self.incompatibilities.is_empty()
            && self.messages.is_empty()
            && self.tags.is_empty()
            && self.dirty_info.is_empty()
            && self.clean_info.is_empty()
            && self.locations.is_empty()
    }
}

impl PartialEq for PluginMetadata {
    fn eq(&self, other: &Self) -> bool {
        // The compiled regex is derived from the name, so the name stands
        // in for it.
        self.name == other.name
            && self.group == other.group
            && self.load_after == other.load_after
            && self.requirements == other.requirements
            && self.incompatibilities == other.incompatibilities
            && self.messages == other.messages
            && self.tags == other.tags
            && self.dirty_info == other.dirty_info
            && self.clean_info == other.clean_info
            && self.locations == other.locations
    }
}

impl Eq for PluginMetadata {}

fn merge_into<T: PartialEq + Clone>(destination: &mut Vec<T>, source: &[T]) {
    for element in source {
        if !destination.contains(element) {
            destination.push(element.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MessageType;

    #[test]
    fn test_merge_with_empty_is_identity() {
        let mut metadata = PluginMetadata::new("a.esp").unwrap();
        metadata.set_group("early");
        metadata.set_load_after_files(vec![File::new("b.esp")]);

        let before = metadata.clone();
        metadata.merge(&PluginMetadata::new("a.esp").unwrap());

        assert_eq!(metadata, before);
    }

    #[test]
    fn test_merge_unions_containers_preserving_order() {
        let mut metadata = PluginMetadata::new("a.esp").unwrap();
        metadata.set_load_after_files(vec![File::new("b.esp"), File::new("c.esp")]);

        let mut other = PluginMetadata::new("a.esp").unwrap();
        other.set_load_after_files(vec![File::new("C.esp"), File::new("d.esp")]);

        metadata.merge(&other);

        let names: Vec<_> = metadata
            .load_after_files()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, ["b.esp", "c.esp", "d.esp"]);
    }

    #[test]
    fn test_merge_replaces_group_only_if_explicit() {
        let mut metadata = PluginMetadata::new("a.esp").unwrap();
        metadata.set_group("early");

        metadata.merge(&PluginMetadata::new("a.esp").unwrap());
        assert_eq!(metadata.group(), Some("early"));

        let mut other = PluginMetadata::new("a.esp").unwrap();
        other.set_group("late");
        metadata.merge(&other);
        assert_eq!(metadata.group(), Some("late"));
    }

    #[test]
    fn test_merge_is_associative_on_containers() {
        let mut a = PluginMetadata::new("p.esp").unwrap();
        a.set_messages(vec![Message::new(MessageType::Say, "one")]);
        let mut b = PluginMetadata::new("p.esp").unwrap();
        b.set_messages(vec![Message::new(MessageType::Say, "two")]);
        let mut c = PluginMetadata::new("p.esp").unwrap();
        c.set_messages(vec![Message::new(MessageType::Say, "three")]);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut right = a.clone();
        right.merge(&bc);

        assert_eq!(left, right);
    }

    #[test]
    fn test_literal_name_matches_case_insensitively() {
        let metadata = PluginMetadata::new("Plugin.esp").unwrap();

        assert!(metadata.name_matches("plugin.ESP"));
        assert!(!metadata.name_matches("Other.esp"));
        assert!(!metadata.is_regex_name());
    }

    #[test]
    fn test_regex_name_matches_queries() {
        let metadata = PluginMetadata::new(r"DLC.*\.esp").unwrap();

        assert!(metadata.is_regex_name());
        assert!(metadata.name_matches("DLCFrostfall.esp"));
        assert!(metadata.name_matches("dlcfrostfall.esp"));
        assert!(!metadata.name_matches("Frostfall.esm"));
    }

    #[test]
    fn test_invalid_regex_name_is_rejected() {
        let result = PluginMetadata::new(r"bad[.esp\");

        assert!(matches!(result, Err(SortError::InvalidArgument(_))));
    }

    #[test]
    fn test_has_name_only() {
        let mut metadata = PluginMetadata::new("a.esp").unwrap();
        assert!(metadata.has_name_only());

        metadata.set_tags(vec![Tag::addition("Relev")]);
        assert!(!metadata.has_name_only());
    }
}
