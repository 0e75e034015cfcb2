//! Offset cache for faster startup
//!
//! Saves resolved offsets to a binary file and reuses them on subsequent runs,
//! skipping the kernel dump and scan. Addresses on disk are stored as if the
//! kernel slide were zero; the current slide is added on load and removed on
//! save, so one file stays valid across reboots.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::OffsetTable;
use crate::arch::Arch;
use crate::error::{Error, Result};

/// Cache file name
pub const CACHE_FILE: &str = "offsets.dat";

/// Current cache format version
pub const CACHE_VERSION: u64 = 1;

/// Why a cache file could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMiss {
    /// No cache file exists
    Missing,
    /// The file exists but could not be read
    Unreadable(String),
    /// The file was written by a different format version
    VersionMismatch { found: u64 },
    /// The file ends before a full record
    Truncated { expected: usize, actual: usize },
}

impl std::fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no cache file"),
            Self::Unreadable(e) => write!(f, "cache file unreadable: {}", e),
            Self::VersionMismatch { found } => write!(
                f,
                "cache is outdated (version {}, expected {})",
                found, CACHE_VERSION
            ),
            Self::Truncated { expected, actual } => write!(
                f,
                "cache file is truncated ({} of {} bytes)",
                actual, expected
            ),
        }
    }
}

/// A versioned offset cache file for one architecture
#[derive(Debug, Clone)]
pub struct OffsetCache {
    path: PathBuf,
    arch: Arch,
}

impl OffsetCache {
    pub fn new<P: Into<PathBuf>>(path: P, arch: Arch) -> Self {
        Self {
            path: path.into(),
            arch,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of a complete cache file
    pub fn file_size(&self) -> usize {
        self.arch.word_size() + OffsetTable::record_size(self.arch)
    }

    /// Load the cached table and add `slide` to its slid fields
    pub fn load(&self, slide: u64) -> std::result::Result<OffsetTable, CacheMiss> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(CacheMiss::Missing),
            Err(e) => return Err(CacheMiss::Unreadable(e.to_string())),
        };

        let word = self.arch.word_size();
        let truncated = CacheMiss::Truncated {
            expected: self.file_size(),
            actual: bytes.len(),
        };

        if bytes.len() < word {
            return Err(truncated);
        }
        let version = self.arch.decode_word(&bytes[..word]);
        if version != CACHE_VERSION {
            return Err(CacheMiss::VersionMismatch { found: version });
        }

        let table = OffsetTable::decode(self.arch, &bytes[word..]).ok_or(truncated)?;
        debug!(
            "Loaded cache {} (version {}), applying slide {:#x}",
            self.path.display(),
            version,
            slide
        );
        Ok(table.slid_by(self.arch, slide))
    }

    /// Write a copy of `table` with `slide` removed from its slid fields.
    ///
    /// Refuses tables holding values wider than a word, which the record
    /// could not store without truncating them.
    pub fn save(&self, table: &OffsetTable, slide: u64) -> Result<()> {
        if let Some((name, value)) = table.field_exceeding(self.arch) {
            return Err(Error::AddressTooWide {
                name,
                value,
                arch: self.arch,
            });
        }
        let unslid = table.unslid_by(self.arch, slide);

        let mut bytes = Vec::with_capacity(self.file_size());
        self.arch.encode_word(CACHE_VERSION, &mut bytes);
        unslid.encode(self.arch, &mut bytes);

        fs::write(&self.path, bytes)?;
        info!("Wrote offsets to {}", self.path.display());
        Ok(())
    }

    /// Delete the cache file; a missing file is not an error
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
