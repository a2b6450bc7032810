//! Metadata value objects.
//!
//! These model the curated information a masterlist or a user's local
//! overrides can attach to a plugin: ordering constraints, group
//! membership, messages, Bash Tag suggestions, cleaning data and download
//! locations. The types here are plain values; parsing them out of YAML is
//! the job of an external collaborator.

pub mod cleaning;
pub mod file;
pub mod group;
pub mod location;
pub mod message;
pub mod plugin_metadata;
pub mod tag;

pub use cleaning::PluginCleaningData;
pub use file::{File, Filename};
pub use group::Group;
pub use location::Location;
pub use message::{Message, MessageType};
pub use plugin_metadata::PluginMetadata;
pub use tag::Tag;
