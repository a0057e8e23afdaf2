//! Project management: discovering and loading workspace files.

pub mod loader;

pub use loader::{load_directory, ModulePathMap, ProjectError};
