// src/archiver/entries.rs

//! Ordered entry buffer shared by every archiver
//!
//! Archivers collect entries here and only touch the destination when the
//! archive is created. Names are normalized to `/`-separated relative
//! paths, directory names end with `/`, and missing parent directories are
//! added ahead of their children using the current directory mode.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an entry's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    File(PathBuf),
    Content(Vec<u8>),
    Directory,
}

/// One archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: EntrySource,
    pub mode: u32,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        matches!(self.source, EntrySource::Directory)
    }

    /// Read the entry's bytes; directories have none
    pub fn read(&self) -> Result<Vec<u8>> {
        match &self.source {
            EntrySource::File(path) => fs::read(path).map_err(|e| Error::io("read", path, e)),
            EntrySource::Content(bytes) => Ok(bytes.clone()),
            EntrySource::Directory => Ok(Vec::new()),
        }
    }
}

/// Normalize an entry name; `None` when nothing is left
pub fn normalize_name(name: &str) -> Option<String> {
    let mut normalized = name.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    let trimmed = normalized.trim_start_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    Some(trimmed.to_string())
}

/// Insertion-ordered set of entries; the first entry for a name wins
#[derive(Debug, Clone)]
pub struct EntrySet {
    entries: IndexMap<String, ArchiveEntry>,
    directory_mode: u32,
    file_mode: u32,
}

impl Default for EntrySet {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrySet {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            directory_mode: 0o755,
            file_mode: 0o644,
        }
    }

    /// Modes applied to entries added without an explicit mode
    pub fn set_default_modes(&mut self, directory_mode: u32, file_mode: u32) {
        self.directory_mode = directory_mode;
        self.file_mode = file_mode;
    }

    pub fn directory_mode(&self) -> u32 {
        self.directory_mode
    }

    pub fn file_mode(&self) -> u32 {
        self.file_mode
    }

    /// Add a file from disk; the source must exist
    pub fn add_file(&mut self, source: &Path, name: &str, mode: Option<u32>) -> Result<bool> {
        if !source.is_file() {
            return Err(Error::MissingSource(source.to_path_buf()));
        }
        let Some(name) = normalize_name(name) else {
            return Ok(false);
        };
        let mode = mode.unwrap_or(self.file_mode);
        Ok(self.insert(ArchiveEntry {
            name,
            source: EntrySource::File(source.to_path_buf()),
            mode,
        }))
    }

    /// Add in-memory content
    pub fn add_content(&mut self, name: &str, content: Vec<u8>, mode: Option<u32>) -> bool {
        let Some(name) = normalize_name(name) else {
            return false;
        };
        let mode = mode.unwrap_or(self.file_mode);
        self.insert(ArchiveEntry {
            name,
            source: EntrySource::Content(content),
            mode,
        })
    }

    /// Add an explicit directory entry
    pub fn add_directory(&mut self, name: &str) -> bool {
        let Some(mut name) = normalize_name(name) else {
            return false;
        };
        if !name.ends_with('/') {
            name.push('/');
        }
        let mode = self.directory_mode;
        self.insert(ArchiveEntry {
            name,
            source: EntrySource::Directory,
            mode,
        })
    }

    fn insert(&mut self, entry: ArchiveEntry) -> bool {
        if self.entries.contains_key(&entry.name) {
            debug!("Skipping duplicate archive entry {}", entry.name);
            return false;
        }
        self.add_parents(&entry.name);
        self.entries.insert(entry.name.clone(), entry);
        true
    }

    fn add_parents(&mut self, name: &str) {
        let trimmed = name.trim_end_matches('/');
        let mut end = 0;
        while let Some(pos) = trimmed[end..].find('/') {
            end += pos + 1;
            let parent = &trimmed[..end];
            if !self.entries.contains_key(parent) {
                self.entries.insert(
                    parent.to_string(),
                    ArchiveEntry {
                        name: parent.to_string(),
                        source: EntrySource::Directory,
                        mode: self.directory_mode,
                    },
                );
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
