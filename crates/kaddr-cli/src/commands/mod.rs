//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod addresses;
pub mod cache;
pub mod hex_utils;
pub mod identify;
pub mod registry;
pub mod resolve;

use anyhow::{Result, bail};
use kaddr_core::{FixedPlatform, PlatformInfo};

/// Identity from explicit flags, or from the running system when omitted
pub fn platform(model: Option<String>, build: Option<String>) -> Result<Box<dyn PlatformInfo>> {
    match (model, build) {
        (Some(model), Some(build)) => Ok(Box::new(FixedPlatform::new(model, build))),
        (None, None) => native_platform(),
        _ => bail!("--model and --build must be given together"),
    }
}

#[cfg(any(target_os = "ios", target_os = "macos"))]
fn native_platform() -> Result<Box<dyn PlatformInfo>> {
    Ok(Box::new(kaddr_core::SysctlPlatform))
}

#[cfg(not(any(target_os = "ios", target_os = "macos")))]
fn native_platform() -> Result<Box<dyn PlatformInfo>> {
    bail!("Device identity cannot be queried on this platform; pass --model and --build")
}
