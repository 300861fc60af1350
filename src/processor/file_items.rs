// src/processor/file_items.rs

//! Single file items, optionally filtered and line-ending rewritten

use super::ArchiveBuild;
use crate::error::{Error, Result, parse_mode};
use crate::model::FileItem;
use crate::paths;
use crate::transform::{LineEnding, line_ending};
use std::path::Path;
use tracing::debug;

pub(super) fn add_file_item(build: &mut ArchiveBuild<'_>, item: &FileItem) -> Result<()> {
    let mode = parse_mode(&item.file_mode)?;
    let source = build.project().resolve(Path::new(&item.source));
    if !source.is_file() {
        return Err(Error::MissingSource(source));
    }

    let output = build.context.output_directory(
        item.output_directory.as_deref(),
        build.include_base_directory(),
        None,
        None,
    )?;
    let dest_name = match &item.dest_name {
        Some(name) => name.clone(),
        None => source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    };
    debug!("Processing file {} as {}{}", source.display(), output, dest_name);

    // transforms write to scratch copies; the source stays untouched
    let mut current = source;
    if item.filtered {
        let filtered = build.scratch_path(&dest_name);
        build.filter()?.filter_file(&current, &filtered)?;
        current = filtered;
    }
    if let Some(terminator) = LineEnding::terminator_for(item.line_ending.as_deref())? {
        let rewritten = build.scratch_path(&dest_name);
        line_ending::rewrite_file(&current, &rewritten, terminator)?;
        current = rewritten;
    }

    build.add_file(&current, &paths::join_entry(&output, &dest_name), Some(mode))
}
