// src/unpack.rs

//! Dependency unpacking into scratch directories
//!
//! Each artifact is extracted once into `work_directory/<file name without
//! archive extension>`. A scratch directory that exists and is at least as
//! new as the artifact is reused as is. Extraction holds an exclusive
//! advisory lock on a sibling `<scratch>.lock` file.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Archive layouts the unpacker understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    TarGz,
    TarBz2,
}

/// Recognized extensions, longest first
const EXTENSIONS: &[(&str, ArchiveKind)] = &[
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tar.gz", ArchiveKind::TarGz),
    (".tbz2", ArchiveKind::TarBz2),
    (".tgz", ArchiveKind::TarGz),
    (".tar", ArchiveKind::Tar),
    (".jar", ArchiveKind::Zip),
    (".zip", ArchiveKind::Zip),
    (".war", ArchiveKind::Zip),
    (".ear", ArchiveKind::Zip),
];

impl ArchiveKind {
    /// Detect the layout from a file name, returning it with the stem
    pub fn detect(file_name: &str) -> Option<(Self, &str)> {
        let lower = file_name.to_ascii_lowercase();
        EXTENSIONS.iter().find_map(|(ext, kind)| {
            lower
                .ends_with(ext)
                .then(|| (*kind, &file_name[..file_name.len() - ext.len()]))
        })
    }
}

/// Outcome of [`Unpacker::unpack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    pub directory: PathBuf,
    /// The scratch directory was up to date and not re-extracted
    pub reused: bool,
    /// Signing metadata files removed from the tree
    pub stripped: usize,
}

/// Exclusive lock on a scratch directory, released on drop
struct ScratchLock {
    #[allow(dead_code)]
    file: File,
}

impl ScratchLock {
    fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
        }
        let file = File::create(path).map_err(|e| Error::io("create lock", path, e))?;
        file.lock_exclusive()
            .map_err(|e| Error::io("acquire lock", path, e))?;
        Ok(Self { file })
    }
}

/// Extracts artifacts below a work directory
#[derive(Debug, Clone)]
pub struct Unpacker {
    work_directory: PathBuf,
}

impl Unpacker {
    pub fn new(work_directory: impl Into<PathBuf>) -> Self {
        Self {
            work_directory: work_directory.into(),
        }
    }

    pub fn work_directory(&self) -> &Path {
        &self.work_directory
    }

    /// Scratch directory for an artifact file
    pub fn scratch_dir(&self, file: &Path) -> Result<PathBuf> {
        let (_, stem) = Self::classify(file)?;
        Ok(self.work_directory.join(stem))
    }

    fn classify(file: &Path) -> Result<(ArchiveKind, String)> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        ArchiveKind::detect(&name)
            .map(|(kind, stem)| (kind, stem.to_string()))
            .ok_or_else(|| Error::Unpack {
                path: file.to_path_buf(),
                message: "unsupported archive extension".to_string(),
            })
    }

    /// Extract `file` unless its scratch directory is current
    ///
    /// With `strip` set, signing metadata is removed from the tree before
    /// the scratch lock is released.
    pub fn unpack(&self, file: &Path, strip: bool) -> Result<Unpacked> {
        let (kind, stem) = Self::classify(file)?;
        if !file.is_file() {
            return Err(Error::MissingSource(file.to_path_buf()));
        }

        let directory = self.work_directory.join(&stem);
        let _lock = ScratchLock::acquire(&self.work_directory.join(format!("{}.lock", stem)))?;

        if is_current(&directory, file) {
            debug!("Reusing unpacked {} at {}", file.display(), directory.display());
            let stripped = if strip { strip_signatures(&directory)? } else { 0 };
            return Ok(Unpacked {
                directory,
                reused: true,
                stripped,
            });
        }

        if directory.exists() {
            fs::remove_dir_all(&directory)
                .map_err(|e| Error::io("clear scratch directory", &directory, e))?;
        }
        fs::create_dir_all(&directory)
            .map_err(|e| Error::io("create directory", &directory, e))?;

        debug!("Unpacking {} into {}", file.display(), directory.display());
        let archive = File::open(file).map_err(|e| Error::io("open", file, e))?;
        let result = match kind {
            ArchiveKind::Zip => extract_zip(archive, &directory),
            ArchiveKind::Tar => extract_tar(archive, &directory),
            ArchiveKind::TarGz => extract_tar(flate2::read::GzDecoder::new(archive), &directory),
            ArchiveKind::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(archive), &directory),
        };

        if let Err(message) = result {
            // a partial tree must not look current on the next run
            let _ = fs::remove_dir_all(&directory);
            return Err(Error::Unpack {
                path: file.to_path_buf(),
                message,
            });
        }

        let stripped = if strip { strip_signatures(&directory)? } else { 0 };
        Ok(Unpacked {
            directory,
            reused: false,
            stripped,
        })
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// True when `directory` exists and is not older than `file`
pub fn is_current(directory: &Path, file: &Path) -> bool {
    if !directory.is_dir() {
        return false;
    }
    match (modified(directory), modified(file)) {
        (Some(dir_time), Some(file_time)) => dir_time >= file_time,
        _ => false,
    }
}

fn extract_zip(file: File, dest: &Path) -> std::result::Result<(), String> {
    let mut archive = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| format!("Failed to read entry {i}: {e}"))?;
        let Some(entry_path) = entry.enclosed_name() else {
            debug!("Skipping unsafe entry {}", entry.name());
            continue;
        };
        let output_path = dest.join(entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path).map_err(|e| format!("Failed to create dir: {e}"))?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to create parent: {e}"))?;
        }
        let mut outfile =
            File::create(&output_path).map_err(|e| format!("Failed to create file: {e}"))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| format!("Failed to write file: {e}"))?;
    }
    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> std::result::Result<(), String> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive.entries().map_err(|e| e.to_string())?;
    for entry in entries {
        let mut entry = entry.map_err(|e| e.to_string())?;
        // unpack_in refuses entries escaping the destination
        entry.unpack_in(dest).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Whether an unpacked path is jar signing metadata
pub fn is_signature_file(relative: &str) -> bool {
    let relative = relative.replace('\\', "/");
    let Some(name) = relative.strip_prefix("META-INF/") else {
        return false;
    };
    if name.contains('/') {
        return false;
    }
    let upper = name.to_ascii_uppercase();
    upper.ends_with(".SF") || upper.ends_with(".RSA") || upper.ends_with(".DSA")
}

/// Delete signing metadata from an unpacked tree, returning the count
pub fn strip_signatures(directory: &Path) -> Result<usize> {
    let meta_inf = directory.join("META-INF");
    if !meta_inf.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(&meta_inf).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::Unpack {
            path: meta_inf.clone(),
            message: e.to_string(),
        })?;
        let name = format!("META-INF/{}", entry.file_name().to_string_lossy());
        if entry.file_type().is_file() && is_signature_file(&name) {
            fs::remove_file(entry.path()).map_err(|e| Error::io("strip signature", entry.path(), e))?;
            debug!("Stripped {}", name);
            removed += 1;
        }
    }
    Ok(removed)
}
