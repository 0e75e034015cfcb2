use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::offset::KernelDump;

/// Produces a copy of the running kernel image
pub trait KernelDumper {
    fn dump_kernel(&mut self) -> Result<KernelDump>;
}

impl<T: KernelDumper + ?Sized> KernelDumper for Box<T> {
    fn dump_kernel(&mut self) -> Result<KernelDump> {
        (**self).dump_kernel()
    }
}

/// Reads an image that was disclosed earlier and saved to disk
#[derive(Debug, Clone)]
pub struct FileDumper {
    path: PathBuf,
}

impl FileDumper {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KernelDumper for FileDumper {
    fn dump_kernel(&mut self) -> Result<KernelDump> {
        let bytes = fs::read(&self.path).map_err(|e| {
            Error::KernelDump(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        if bytes.is_empty() {
            return Err(Error::KernelDump(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        debug!("Read {} byte kernel image from {}", bytes.len(), self.path.display());
        Ok(KernelDump::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_dumper_reads_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.bin");
        fs::write(&path, [0xfe, 0xed, 0xfa, 0xcf]).unwrap();

        let dump = FileDumper::new(&path).dump_kernel().unwrap();
        assert_eq!(dump.as_bytes(), &[0xfe, 0xed, 0xfa, 0xcf]);
    }

    #[test]
    fn test_file_dumper_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.bin");
        assert!(matches!(
            FileDumper::new(&missing).dump_kernel(),
            Err(Error::KernelDump(_))
        ));

        let empty = dir.path().join("empty.bin");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            FileDumper::new(&empty).dump_kernel(),
            Err(Error::KernelDump(_))
        ));
    }
}
