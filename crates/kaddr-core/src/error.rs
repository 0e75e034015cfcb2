use std::path::PathBuf;

use thiserror::Error;

use crate::arch::Arch;
use crate::device::{Model, OsBuild};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unrecognized device: {0}")]
    UnrecognizedDevice(String),

    #[error("Unrecognized OS version: {0}")]
    UnrecognizedOsVersion(String),

    #[error("sysctl(\"{name}\") failed: {source}")]
    PlatformQuery {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported device/OS combination: {model} on {build} ({arch})")]
    UnsupportedCombination {
        model: Model,
        build: OsBuild,
        arch: Arch,
    },

    #[error("Failed to parse config file {}: {reason}. Please either repair or remove it.", path.display())]
    MalformedConfig { path: PathBuf, reason: String },

    #[error("Failed to dump kernel: {0}")]
    KernelDump(String),

    #[error("Failed to find offsets: {0}")]
    OffsetSearchFailed(String),

    #[error("{name} = {value:#x} does not fit one {arch} word")]
    AddressTooWide {
        name: &'static str,
        value: u64,
        arch: Arch,
    },

    #[error("Offsets have not been initialized")]
    NotInitialized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
