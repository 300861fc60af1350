// src/processor/file_sets.rs

//! File sets: directory subtrees added below an output prefix
//!
//! A file set without a directory reads from the project base directory
//! into the archive root; otherwise the directory doubles as the default
//! output directory. Relative directories resolve against the archive base
//! directory when one is configured, else against the project base.

use super::ArchiveBuild;
use crate::error::{Error, Result, parse_mode};
use crate::model::{FileSet, Project};
use crate::scanner::DirectoryScanner;
use crate::transform::{LineEnding, line_ending};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub(super) fn add_file_set<'p>(
    build: &mut ArchiveBuild<'p>,
    set: &FileSet,
    module: Option<&'p Project>,
) -> Result<()> {
    let directory_mode = parse_mode(&set.directory_mode)?;
    let file_mode = parse_mode(&set.file_mode)?;

    let (source, default_output) = match &set.directory {
        None => (build.project().basedir.clone(), String::new()),
        Some(directory) => (resolve_directory(build, directory)?, directory.clone()),
    };
    let template = set.output_directory.clone().unwrap_or(default_output);

    debug!(
        "Processing FileSet {} (output={})",
        source.display(),
        template
    );
    if !source.is_dir() {
        debug!("FileSet directory {} does not exist, skipping", source.display());
        return Ok(());
    }

    build.set_default_modes(directory_mode, file_mode);
    let output = build.context.output_directory(
        Some(&template),
        build.include_base_directory(),
        module,
        None,
    )?;
    let scanner = DirectoryScanner::with_patterns(&set.includes, &set.excludes)?;

    match LineEnding::terminator_for(set.line_ending.as_deref())? {
        Some(terminator) => {
            let rewritten = build.scratch_path("fileset");
            fs::create_dir_all(&rewritten)
                .map_err(|e| Error::io("create directory", &rewritten, e))?;
            line_ending::rewrite_tree(&source, &scanner, &rewritten, terminator)?;
            build.add_tree(&rewritten, &output, &DirectoryScanner::new())
        }
        None => build.add_tree(&source, &output, &scanner),
    }
}

fn resolve_directory(build: &ArchiveBuild<'_>, directory: &str) -> Result<PathBuf> {
    let path = Path::new(directory);
    let Some(base) = &build.config().archive_base_directory else {
        return Ok(build.project().resolve(path));
    };

    let base = build.project().resolve(base);
    if !base.is_dir() {
        return Err(Error::MissingSource(base));
    }
    Ok(if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    })
}
