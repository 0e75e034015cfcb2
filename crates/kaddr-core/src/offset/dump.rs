use std::fs;
use std::path::Path;

use crate::error::Result;

/// Kernel dump file name
pub const KERNEL_FILE: &str = "kernel.bin";

/// Raw bytes of a disclosed kernel image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelDump {
    bytes: Vec<u8>,
}

impl KernelDump {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the image to disk as a diagnostic artifact
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.bytes)?;
        Ok(())
    }
}

impl From<Vec<u8>> for KernelDump {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}
