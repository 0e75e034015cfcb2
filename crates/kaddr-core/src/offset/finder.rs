//! Offset discovery over a kernel dump.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KernelDump, OffsetTable};
use crate::error::{Error, Result};

/// Fills an offset table by scanning a dumped kernel image
pub trait OffsetFinder {
    /// `anchor` is the unslid reference address the scan starts from
    fn find_all_offsets(&self, dump: &KernelDump, anchor: u64) -> Result<OffsetTable>;
}

impl<F> OffsetFinder for F
where
    F: Fn(&KernelDump, u64) -> Result<OffsetTable>,
{
    fn find_all_offsets(&self, dump: &KernelDump, anchor: u64) -> Result<OffsetTable> {
        self(dump, anchor)
    }
}

/// Offsets produced ahead of time by an external scanner, stored as JSON.
///
/// Values in the file are live (slid) addresses for the current boot.
#[derive(Debug, Clone)]
pub struct PrecomputedOffsets {
    path: PathBuf,
}

impl PrecomputedOffsets {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OffsetFinder for PrecomputedOffsets {
    fn find_all_offsets(&self, dump: &KernelDump, anchor: u64) -> Result<OffsetTable> {
        debug!(
            "Reading precomputed offsets from {} (dump: {} bytes, anchor: {:#x})",
            self.path.display(),
            dump.len(),
            anchor
        );
        let content = fs::read_to_string(&self.path)?;
        let table: OffsetTable = serde_json::from_str(&content)?;
        if !table.is_complete() {
            return Err(Error::OffsetSearchFailed(format!(
                "{} is missing slid offsets",
                self.path.display()
            )));
        }
        Ok(table)
    }
}
