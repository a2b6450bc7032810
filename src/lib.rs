// loadsort - deterministic load order sorting for Bethesda game plugins
//
// This is the library crate containing the sorting engine and its metadata
// model. Plugin parsing, YAML metadata parsing and condition evaluation are
// external collaborators accessed through the interface in `plugin`.

pub mod error;
pub mod filename;
pub mod game;
pub mod loadorder;
pub mod logging;
pub mod metadata;
pub mod plugin;
pub mod sorting;

// Re-export commonly used types for convenience
pub use error::{EdgeType, SortError, Vertex};
pub use game::GameType;
pub use metadata::{
    File, Filename, Group, Location, Message, MessageType, PluginCleaningData, PluginMetadata, Tag,
};
pub use plugin::PluginProvider;
pub use sorting::{sort_plugins, PluginSortingData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
