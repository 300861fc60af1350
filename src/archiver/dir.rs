// src/archiver/dir.rs

//! `dir` format: the assembly laid out as a plain directory tree

use super::entries::EntrySet;
use super::Archiver;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct DirectoryArchiver {
    format: String,
    entries: EntrySet,
    dest: Option<PathBuf>,
}

impl DirectoryArchiver {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
            entries: EntrySet::new(),
            dest: None,
        }
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::io("set permissions", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

impl Archiver for DirectoryArchiver {
    fn format(&self) -> &str {
        &self.format
    }

    fn entries(&self) -> &EntrySet {
        &self.entries
    }

    fn entries_mut(&mut self) -> &mut EntrySet {
        &mut self.entries
    }

    fn set_dest_file(&mut self, dest: &Path) {
        self.dest = Some(dest.to_path_buf());
    }

    fn dest_file(&self) -> Option<&Path> {
        self.dest.as_deref()
    }

    fn create_archive(&mut self) -> Result<PathBuf> {
        let dest = self
            .dest
            .clone()
            .ok_or_else(|| Error::Config("dir archiver has no destination".to_string()))?;

        fs::create_dir_all(&dest).map_err(|e| Error::io("create directory", &dest, e))?;

        // directory modes are applied after their contents are written
        let mut directories = Vec::new();
        for entry in self.entries.iter() {
            let target = dest.join(entry.name.trim_end_matches('/'));
            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|e| Error::io("create directory", &target, e))?;
                directories.push((target, entry.mode));
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io("create directory", parent, e))?;
            }
            fs::write(&target, entry.read()?).map_err(|e| Error::io("write", &target, e))?;
            set_mode(&target, entry.mode)?;
        }

        for (path, mode) in directories.iter().rev() {
            set_mode(path, *mode)?;
        }

        debug!("Wrote {} entries below {}", self.entries.len(), dest.display());
        Ok(dest)
    }
}
