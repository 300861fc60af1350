// src/lib.rs

//! Archive assembly engine
//!
//! Turns declarative assembly descriptors plus host project metadata into
//! distributable archives (zip, jar, war, ear, tar with optional gzip or
//! bzip2 compression, or a plain directory).
//!
//! # Architecture
//!
//! - Templates: output paths and file names are resolved against ordered,
//!   precedence-ranked value sources ([`interpolation`])
//! - Selection: dependency sets pick artifacts by scope and coordinates
//!   ([`selection`]); file sets pick files by Ant-style patterns ([`scanner`])
//! - Transforms: token filtering and line-ending rewrites run on scratch
//!   copies before content enters an archive ([`transform`])
//! - Registry merging: `META-INF/plexus/components.xml` fragments from many
//!   unpacked dependencies are merged into one document per archive
//!   ([`registry`])
//! - Archivers: every format sits behind the [`archiver::Archiver`] trait

pub mod archiver;
pub mod config;
pub mod descriptor;
mod error;
pub mod interpolation;
pub mod model;
pub mod paths;
pub mod processor;
pub mod registry;
pub mod scanner;
pub mod selection;
pub mod transform;
pub mod unpack;

pub use archiver::{Archiver, ArchiverRegistry, ArchiverSettings, LongFileMode};
pub use config::{AssemblerConfig, BuildRequest};
pub use error::{Error, ErrorKind, Result, parse_mode};
pub use model::{Artifact, Assembly, DependencySet, FileItem, FileSet, Project, Scope};
pub use processor::{ArtifactAttacher, AssemblyProcessor, AttachedArtifact};
pub use registry::ComponentRegistry;
