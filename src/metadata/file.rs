//! Files referenced by plugin metadata.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::filename::{compare_filenames, normalize_filename};

/// A filename that compares and hashes case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filename(String);

impl Filename {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The filename as given, with its original casing.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Filename {
    fn eq(&self, other: &Self) -> bool {
        compare_filenames(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for Filename {}

impl PartialOrd for Filename {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Filename {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_filenames(&self.0, &other.0)
    }
}

impl Hash for Filename {
    fn hash<H: Hasher>(&self, state: &mut H) {
        normalize_filename(&self.0).hash(state);
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Filename {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Filename {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A file that a plugin interacts with: a requirement, an incompatibility
/// or a load-after target.
///
/// The optional condition string is evaluated by the external condition
/// evaluator before the entry reaches the sorting core; the core treats it
/// as opaque data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    name: Filename,
    display_name: Option<String>,
    condition: Option<String>,
}

impl File {
    pub fn new(name: impl Into<Filename>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            condition: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// The referenced filename.
    pub fn name(&self) -> &Filename {
        &self.name
    }

    /// The name to display to users, falling back to the filename.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.name.as_str())
    }

    /// The condition string gating this entry, if any.
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_filename_equality_ignores_case() {
        assert_eq!(Filename::from("Skyrim.esm"), Filename::from("skyrim.ESM"));
        assert_ne!(Filename::from("Skyrim.esm"), Filename::from("Update.esm"));
    }

    #[test]
    fn test_filename_hash_agrees_with_equality() {
        let mut set = HashSet::new();
        set.insert(Filename::from("Plugin.esp"));

        assert!(set.contains(&Filename::from("PLUGIN.ESP")));
    }

    #[test]
    fn test_file_equality_includes_detail_fields() {
        let plain = File::new("a.esp");
        let conditioned = File::new("a.esp").with_condition("file(\"b.esp\")");

        assert_eq!(plain, File::new("A.esp"));
        assert_ne!(plain, conditioned);
    }

    #[test]
    fn test_display_name_falls_back_to_filename() {
        assert_eq!(File::new("a.esp").display_name(), "a.esp");
        assert_eq!(
            File::new("a.esp").with_display_name("A Mod").display_name(),
            "A Mod"
        );
    }
}
