// src/processor/dependency_sets.rs

//! Dependency sets: selected artifacts copied or unpacked into the archive

use super::ArchiveBuild;
use crate::error::{Error, Result, parse_mode};
use crate::model::{Artifact, DependencySet};
use crate::paths;
use crate::scanner::DirectoryScanner;
use crate::selection::ArtifactSelector;
use std::path::PathBuf;
use tracing::debug;

pub(super) fn add_dependency_set(build: &mut ArchiveBuild<'_>, set: &DependencySet) -> Result<()> {
    let directory_mode = parse_mode(&set.directory_mode)?;
    let file_mode = parse_mode(&set.file_mode)?;
    debug!(
        "Processing DependencySet (output={})",
        set.output_directory.as_deref().unwrap_or_default()
    );
    build.set_default_modes(directory_mode, file_mode);

    let selector = ArtifactSelector::for_set(set)?;
    for artifact in selector.select(build.processor.artifacts) {
        add_artifact(build, set, artifact)?;
    }
    Ok(())
}

fn add_artifact<'p>(
    build: &mut ArchiveBuild<'p>,
    set: &DependencySet,
    artifact: &'p Artifact,
) -> Result<()> {
    let file = artifact
        .file
        .as_ref()
        .ok_or_else(|| Error::MissingSource(PathBuf::from(artifact.id())))?;

    let output = build.context.output_directory(
        set.output_directory.as_deref(),
        build.include_base_directory(),
        None,
        artifact.project.as_deref(),
    )?;

    if set.unpack {
        let unpacked = build.unpacker.unpack(file, build.strips_signatures())?;
        return build.add_tree(&unpacked.directory, &output, &DirectoryScanner::new());
    }

    let name = build
        .context
        .evaluate_file_name(&set.output_file_name_mapping, artifact, None)?;
    build.add_file(file, &paths::join_entry(&output, &name), None)
}
