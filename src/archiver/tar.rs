// src/archiver/tar.rs

//! Tar archiver with optional gzip or bzip2 compression
//!
//! Entries use GNU headers. Names longer than 100 bytes are handled
//! according to the configured [`LongFileMode`].

use super::entries::{EntrySet, EntrySource};
use super::format::{Compression, LongFileMode};
use super::{Archiver, build_timestamp, file_mtime, persist, staged_file};
use crate::error::{Error, Result};
use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Longest name that fits a plain tar header
const MAX_NAME_BYTES: usize = 100;

pub struct TarArchiver {
    format: String,
    compression: Compression,
    long_file_mode: LongFileMode,
    entries: EntrySet,
    dest: Option<PathBuf>,
}

impl TarArchiver {
    pub fn new(format: &str, compression: Compression, long_file_mode: LongFileMode) -> Self {
        Self {
            format: format.to_string(),
            compression,
            long_file_mode,
            entries: EntrySet::new(),
            dest: None,
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Apply the long file policy; `None` drops the entry
    fn entry_name(&self, name: &str, dest: &Path) -> Result<Option<String>> {
        let name = name.trim_end_matches('/');
        if name.len() <= MAX_NAME_BYTES {
            return Ok(Some(name.to_string()));
        }

        match self.long_file_mode {
            LongFileMode::Gnu => Ok(Some(name.to_string())),
            LongFileMode::Warn => {
                warn!(
                    "Entry name {} is longer than {} bytes, writing GNU long name record",
                    name, MAX_NAME_BYTES
                );
                Ok(Some(name.to_string()))
            }
            LongFileMode::Truncate => {
                let mut cut = MAX_NAME_BYTES;
                while !name.is_char_boundary(cut) {
                    cut -= 1;
                }
                Ok(Some(name[..cut].to_string()))
            }
            LongFileMode::Omit => {
                info!("Omitting {}: name longer than {} bytes", name, MAX_NAME_BYTES);
                Ok(None)
            }
            LongFileMode::Fail => Err(Error::archive(
                dest,
                format!("entry name {} is longer than {} bytes", name, MAX_NAME_BYTES),
            )),
        }
    }

    fn append_entries<W: Write>(&self, archive: &mut tar::Builder<W>, dest: &Path) -> Result<()> {
        let timestamp = build_timestamp();

        for entry in self.entries.iter() {
            let Some(name) = self.entry_name(&entry.name, dest)? else {
                continue;
            };

            let mut header = tar::Header::new_gnu();
            header.set_mode(entry.mode);

            if entry.is_dir() {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mtime(timestamp);
                header.set_cksum();
                archive
                    .append_data(&mut header, &name, std::io::empty())
                    .map_err(|e| Error::io("write tar entry", dest, e))?;
                continue;
            }

            let mtime = match &entry.source {
                EntrySource::File(path) => file_mtime(path, timestamp),
                _ => timestamp,
            };
            let content = entry.read()?;

            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mtime(mtime);
            header.set_cksum();
            archive
                .append_data(&mut header, &name, content.as_slice())
                .map_err(|e| Error::io("write tar entry", dest, e))?;
        }

        Ok(())
    }
}

impl Archiver for TarArchiver {
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
            .ok_or_else(|| Error::Config("tar archiver has no destination file".to_string()))?;

        let mut staged = staged_file(&dest)?;
        let file = staged.as_file_mut();

        debug!(
            "Writing {} entries to {} ({} compression)",
            self.entries.len(),
            dest.display(),
            self.compression
        );

        match self.compression {
            Compression::None => {
                let mut archive = tar::Builder::new(file);
                self.append_entries(&mut archive, &dest)?;
                archive
                    .into_inner()
                    .map_err(|e| Error::io("finish tar", &dest, e))?;
            }
            Compression::Gzip => {
                let encoder = GzEncoder::new(file, flate2::Compression::default());
                let mut archive = tar::Builder::new(encoder);
                self.append_entries(&mut archive, &dest)?;
                archive
                    .into_inner()
                    .and_then(|encoder| encoder.finish())
                    .map_err(|e| Error::io("finish tar", &dest, e))?;
            }
            Compression::Bzip2 => {
                let encoder = BzEncoder::new(file, bzip2::Compression::default());
                let mut archive = tar::Builder::new(encoder);
                self.append_entries(&mut archive, &dest)?;
                archive
                    .into_inner()
                    .and_then(|encoder| encoder.finish())
                    .map_err(|e| Error::io("finish tar", &dest, e))?;
            }
        }

        persist(staged, &dest)?;
        Ok(dest)
    }
}
