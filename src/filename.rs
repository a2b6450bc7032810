//! Locale-invariant filename comparison.
//!
//! Plugin filenames are case-insensitive: `skyrim.esm` and `Skyrim.esm` are
//! the same plugin. Comparisons here use Unicode uppercase folding rather
//! than any locale's collation rules, so results are identical across
//! platforms and runs.

use std::cmp::Ordering;
use std::collections::HashMap;

/// The extension appended to a plugin file to deactivate it on disk.
pub const GHOST_FILE_EXTENSION: &str = ".ghost";

/// Compare two strings as filenames, ignoring case.
///
/// The comparison folds both inputs through the Unicode uppercase mapping
/// and compares the folded character sequences, without allocating.
pub fn compare_filenames(lhs: &str, rhs: &str) -> Ordering {
    lhs.chars()
        .flat_map(char::to_uppercase)
        .cmp(rhs.chars().flat_map(char::to_uppercase))
}

/// Fold a filename to the form used for comparison, suitable for use as a
/// map key or set element.
///
/// `normalize_filename(a) == normalize_filename(b)` exactly when
/// `compare_filenames(a, b)` is [`Ordering::Equal`].
pub fn normalize_filename(filename: &str) -> String {
    filename.chars().flat_map(char::to_uppercase).collect()
}

/// Strip a trailing `.ghost` extension, if present.
///
/// The match is case-insensitive. Whether a game honours ghosted plugins at
/// all is decided by [`GameType::allows_ghosted_plugins`](crate::game::GameType::allows_ghosted_plugins).
pub fn trim_dot_ghost(filename: &str) -> &str {
    let ghost_len = GHOST_FILE_EXTENSION.len();
    if filename.len() >= ghost_len && filename.is_char_boundary(filename.len() - ghost_len) {
        let (stem, extension) = filename.split_at(filename.len() - ghost_len);
        if extension.eq_ignore_ascii_case(GHOST_FILE_EXTENSION) {
            return stem;
        }
    }

    filename
}

/// A memoising cache of normalised filenames, living for one sort.
///
/// Sorting compares the same names against each other many times; folding
/// each name once and reusing the result keeps repeated lookups cheap.
#[derive(Debug, Default)]
pub struct ComparableFilenameCache {
    cache: HashMap<String, String>,
}

impl ComparableFilenameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the normalised form of a filename, computing and caching it on
    /// first use.
    pub fn get_or_insert(&mut self, filename: &str) -> &str {
        self.cache
            .entry(filename.to_string())
            .or_insert_with(|| normalize_filename(filename))
    }

    /// Compare two filenames through the cache.
    pub fn compare(&mut self, lhs: &str, rhs: &str) -> Ordering {
        if lhs == rhs {
            return Ordering::Equal;
        }

        let lhs = self.get_or_insert(lhs).to_string();
        let rhs = self.get_or_insert(rhs);
        lhs.as_str().cmp(rhs)
    }
}
