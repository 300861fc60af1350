// src/archiver/format.rs

//! Format tag parsing
//!
//! A tag starting with `tar` selects the tar archiver, with the text after
//! the first `.` naming the compression (`gz` or `bz2`). `war` selects the
//! web-archive archiver with descriptor validation bypassed. Every other
//! tag names a registered archiver verbatim.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compression applied to a tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
            Self::Bzip2 => write!(f, "bzip2"),
        }
    }
}

/// Treatment of tar entry names longer than 100 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongFileMode {
    /// Write a GNU long-name record and log a warning
    #[default]
    Warn,
    /// Abort the archive
    Fail,
    /// Cut the name to 100 bytes
    Truncate,
    /// Write a GNU long-name record
    Gnu,
    /// Leave the entry out
    Omit,
}

impl FromStr for LongFileMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            "truncate" => Ok(Self::Truncate),
            "gnu" => Ok(Self::Gnu),
            "omit" => Ok(Self::Omit),
            other => Err(Error::InvalidLongFileMode(other.to_string())),
        }
    }
}

impl fmt::Display for LongFileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Truncate => "truncate",
            Self::Gnu => "gnu",
            Self::Omit => "omit",
        };
        f.write_str(name)
    }
}

/// Result of parsing a format tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    /// Tag as written in the descriptor; also the output file extension
    pub tag: String,
    /// Name of the registered archiver to use
    pub archiver: String,
    pub compression: Compression,
    /// Skip archiver-specific descriptor checks (`WEB-INF/web.xml` for war)
    pub bypass_validation: bool,
}

/// Parse a format tag
pub fn select(tag: &str) -> Result<FormatSelection> {
    if tag.starts_with("tar") {
        let compression = match tag.split_once('.') {
            None => Compression::None,
            Some((_, "gz")) => Compression::Gzip,
            Some((_, "bz2")) => Compression::Bzip2,
            Some((_, other)) => {
                return Err(Error::UnknownCompression {
                    format: tag.to_string(),
                    compression: other.to_string(),
                });
            }
        };
        return Ok(FormatSelection {
            tag: tag.to_string(),
            archiver: "tar".to_string(),
            compression,
            bypass_validation: false,
        });
    }

    Ok(FormatSelection {
        tag: tag.to_string(),
        archiver: tag.to_string(),
        compression: Compression::None,
        bypass_validation: tag == "war",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tar_compression() {
        assert_eq!(select("tar").unwrap().compression, Compression::None);
        assert_eq!(select("tar.gz").unwrap().compression, Compression::Gzip);

        let bz2 = select("tar.bz2").unwrap();
        assert_eq!(bz2.archiver, "tar");
        assert_eq!(bz2.compression, Compression::Bzip2);
        assert_eq!(bz2.tag, "tar.bz2");
    }

    #[test]
    fn test_unknown_compression() {
        let err = select("tar.xz").unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownCompression { ref compression, .. } if compression == "xz"
        ));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_war_bypasses_validation() {
        let war = select("war").unwrap();
        assert_eq!(war.archiver, "war");
        assert!(war.bypass_validation);
        assert!(!select("jar").unwrap().bypass_validation);
    }

    #[test]
    fn test_verbatim_tags() {
        assert_eq!(select("zip").unwrap().archiver, "zip");
        assert_eq!(select("rar").unwrap().archiver, "rar");
    }

    #[test]
    fn test_long_file_mode() {
        assert_eq!("gnu".parse::<LongFileMode>().unwrap(), LongFileMode::Gnu);
        assert_eq!(LongFileMode::default(), LongFileMode::Warn);
        assert!(matches!(
            "posix".parse::<LongFileMode>(),
            Err(Error::InvalidLongFileMode(_))
        ));
    }
}
