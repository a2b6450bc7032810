//! Game identification and per-game plugin file rules.
//!
//! Every supported engine loads the classic `.esp`/`.esm` pair, but the
//! later engines add light and medium plugin tiers, OpenMW has its own
//! extensions, and the archive format switched from BSA to BA2 with
//! Fallout 4. The sorting core consults these rules when classifying
//! plugins and resolving override record counts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The set of supported game engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
    /// The Elder Scrolls III: Morrowind.
    Tes3,
    /// OpenMW, the open-source Morrowind engine reimplementation.
    Openmw,
    /// The Elder Scrolls IV: Oblivion.
    Tes4,
    /// The Elder Scrolls IV: Oblivion Remastered.
    OblivionRemastered,
    /// The Elder Scrolls V: Skyrim.
    Tes5,
    /// The Elder Scrolls V: Skyrim Special Edition.
    Tes5se,
    /// The Elder Scrolls V: Skyrim VR.
    Tes5vr,
    /// Fallout 3.
    Fo3,
    /// Fallout: New Vegas.
    Fonv,
    /// Fallout 4.
    Fo4,
    /// Fallout 4 VR.
    Fo4vr,
    /// Starfield.
    Starfield,
}

impl GameType {
    /// The file extension of the archive format the game loads plugin assets
    /// from.
    pub fn archive_file_extension(self) -> &'static str {
        match self {
            GameType::Fo4 | GameType::Fo4vr | GameType::Starfield => ".ba2",
            _ => ".bsa",
        }
    }

    /// Whether the game engine supports the light plugin tier (`.esl` files
    /// and light-flagged plugins).
    pub fn supports_light_plugins(self) -> bool {
        matches!(
            self,
            GameType::Tes5se
                | GameType::Tes5vr
                | GameType::Fo4
                | GameType::Fo4vr
                | GameType::Starfield
        )
    }

    /// Whether the game engine supports the medium plugin tier.
    pub fn supports_medium_plugins(self) -> bool {
        self == GameType::Starfield
    }

    /// Whether a `.ghost` suffix on a plugin file is recognised and stripped
    /// when identifying the plugin. OpenMW treats ghosted files as ordinary
    /// non-plugin files.
    pub fn allows_ghosted_plugins(self) -> bool {
        self != GameType::Openmw
    }

    /// Whether the override record count for this game is derived from the
    /// overlap between a plugin and its masters, rather than read directly
    /// from the plugin header.
    pub fn derives_override_counts_from_masters(self) -> bool {
        matches!(self, GameType::Tes3 | GameType::Openmw)
    }

    /// Whether `extension` (including the leading dot, any case) names a
    /// plugin file for this game.
    pub fn is_valid_plugin_extension(self, extension: &str) -> bool {
        if extension.eq_ignore_ascii_case(".esp") || extension.eq_ignore_ascii_case(".esm") {
            return true;
        }

        if extension.eq_ignore_ascii_case(".esl") {
            return self.supports_light_plugins();
        }

        self == GameType::Openmw
            && (extension.eq_ignore_ascii_case(".omwgame")
                || extension.eq_ignore_ascii_case(".omwaddon")
                || extension.eq_ignore_ascii_case(".omwscripts"))
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameType::Tes3 => "Morrowind",
            GameType::Openmw => "OpenMW",
            GameType::Tes4 => "Oblivion",
            GameType::OblivionRemastered => "Oblivion Remastered",
            GameType::Tes5 => "Skyrim",
            GameType::Tes5se => "Skyrim Special Edition",
            GameType::Tes5vr => "Skyrim VR",
            GameType::Fo3 => "Fallout 3",
            GameType::Fonv => "Fallout: New Vegas",
            GameType::Fo4 => "Fallout 4",
            GameType::Fo4vr => "Fallout 4 VR",
            GameType::Starfield => "Starfield",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_extension_is_ba2_only_for_fo4_and_starfield() {
        assert_eq!(GameType::Fo4.archive_file_extension(), ".ba2");
        assert_eq!(GameType::Fo4vr.archive_file_extension(), ".ba2");
        assert_eq!(GameType::Starfield.archive_file_extension(), ".ba2");
        assert_eq!(GameType::Tes5se.archive_file_extension(), ".bsa");
        assert_eq!(GameType::Tes3.archive_file_extension(), ".bsa");
    }

    #[test]
    fn test_light_plugin_support() {
        assert!(GameType::Tes5se.supports_light_plugins());
        assert!(GameType::Starfield.supports_light_plugins());
        assert!(!GameType::Tes5.supports_light_plugins());
        assert!(!GameType::Openmw.supports_light_plugins());
    }

    #[test]
    fn test_only_openmw_keeps_ghosted_files() {
        assert!(!GameType::Openmw.allows_ghosted_plugins());
        assert!(GameType::Tes5.allows_ghosted_plugins());
    }

    #[test]
    fn test_openmw_extensions() {
        assert!(GameType::Openmw.is_valid_plugin_extension(".omwaddon"));
        assert!(GameType::Openmw.is_valid_plugin_extension(".omwgame"));
        assert!(GameType::Openmw.is_valid_plugin_extension(".omwscripts"));
        assert!(!GameType::Tes5se.is_valid_plugin_extension(".omwaddon"));
    }

    #[test]
    fn test_esl_extension_requires_light_plugin_support() {
        assert!(GameType::Fo4.is_valid_plugin_extension(".esl"));
        assert!(GameType::Fo4.is_valid_plugin_extension(".ESL"));
        assert!(!GameType::Fonv.is_valid_plugin_extension(".esl"));
        assert!(GameType::Fonv.is_valid_plugin_extension(".esp"));
    }
}
