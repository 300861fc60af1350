// src/model/mod.rs

//! Descriptor and host model types
//!
//! - [`Assembly`] and its rule sets describe what goes into an archive
//! - [`Project`] and [`Artifact`] are supplied by the host build and are only
//!   read, never resolved here

mod artifact;
mod assembly;
mod project;

pub use artifact::{Artifact, ArtifactHandler, Scope};
pub use assembly::{
    Assembly, ComponentDescriptor, DependencySet, FileItem, FileSet, DEFAULT_DIRECTORY_MODE,
    DEFAULT_FILE_MODE, DEFAULT_FILE_NAME_MAPPING,
};
pub use project::{BuildPaths, FieldMap, Project};
