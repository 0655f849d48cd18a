//! Registry implementations for fetching project metadata

pub mod modrinth;

pub use modrinth::ModrinthRegistry;
