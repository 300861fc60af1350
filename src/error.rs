// src/error.rs

//! Error types for archive assembly
//!
//! Every failure is classified as either a configuration problem (detected
//! before any archive is opened) or a content problem (fatal for the format
//! currently being built, leaving earlier archives of the run on disk).

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid descriptor or configuration; raised before archiving starts
    Configuration,
    /// Unreadable or malformed content; aborts the current format only
    Content,
}

/// Assembly errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("No assembly descriptors found")]
    NoDescriptors,

    #[error("The assembly id {0} is used more than once")]
    DuplicateAssemblyId(String),

    #[error("Descriptor with ID '{0}' not found")]
    UnknownDescriptorRef(String),

    #[error("Failed to parse descriptor {}: {source}", .path.display())]
    DescriptorParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unable to obtain archiver for format '{0}'")]
    UnsupportedFormat(String),

    #[error("Unknown compression format '{compression}' in archive format '{format}'")]
    UnknownCompression { format: String, compression: String },

    #[error("Invalid tar long file mode '{0}' (expected warn, fail, truncate, gnu or omit)")]
    InvalidLongFileMode(String),

    #[error("Illegal line ending specified: '{0}'")]
    InvalidLineEndingMode(String),

    #[error("Invalid octal mode '{0}'")]
    InvalidMode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Failed to {stage} {}: {source}", .path.display())]
    Io {
        stage: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to unpack {}: {message}", .path.display())]
    Unpack { path: PathBuf, message: String },

    #[error("Error processing manifest {}: {message}", .path.display())]
    Manifest { path: PathBuf, message: String },

    #[error("Malformed template '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Error finalizing component-set for archive ({source_name}): {message}")]
    Registry {
        source_name: String,
        message: String,
    },

    #[error("Error creating archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },
}

impl Error {
    /// Wrap an I/O error with the processing stage and offending path
    pub fn io(stage: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            stage,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build an archive error for the given destination
    pub fn archive(path: impl AsRef<Path>, message: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.as_ref().to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoDescriptors
            | Self::DuplicateAssemblyId(_)
            | Self::UnknownDescriptorRef(_)
            | Self::DescriptorParse { .. }
            | Self::UnsupportedFormat(_)
            | Self::UnknownCompression { .. }
            | Self::InvalidLongFileMode(_)
            | Self::InvalidLineEndingMode(_)
            | Self::InvalidMode(_)
            | Self::Config(_) => ErrorKind::Configuration,
            Self::MissingSource(_)
            | Self::Io { .. }
            | Self::Unpack { .. }
            | Self::Manifest { .. }
            | Self::Template { .. }
            | Self::Registry { .. }
            | Self::Archive { .. } => ErrorKind::Content,
        }
    }

    /// True for errors detected before any archive is opened
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Parse an octal permission string such as `0755`
pub fn parse_mode(mode: &str) -> Result<u32> {
    let trimmed = mode.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidMode(mode.to_string()));
    }
    u32::from_str_radix(trimmed, 8).map_err(|_| Error::InvalidMode(mode.to_string()))
}
