//! Parser layer
//! - types.rs: Common types (PackageRef)
//! - links.rs: Mod list parser (markdown links and bare Modrinth URLs)

pub mod links;
pub mod types;

pub use links::LinkParser;
pub use types::PackageRef;
