//! # kaddr-core
//!
//! Kernel address resolution for the iOS 9 exploitation toolkit.
//!
//! This crate provides:
//! - Device and firmware identification (`hw.model`, `kern.osversion`)
//! - A compiled-in registry of anchor/vtab addresses per device and build
//! - An operator-editable override file for those addresses
//! - A versioned, slide-independent offset cache
//! - The resolver that ties these together with a kernel dump and scan

pub mod arch;
pub mod config;
pub mod device;
pub mod error;
pub mod kernel;
pub mod offset;
pub mod registry;
pub mod resolver;

pub use arch::Arch;
pub use device::{DeviceIdentifier, DeviceIdentity, FixedPlatform, Model, OsBuild, PlatformInfo};
#[cfg(any(target_os = "ios", target_os = "macos"))]
pub use device::SysctlPlatform;
pub use error::{Error, Result};
pub use kernel::{FileDumper, FixedSlide, KernelDumper, SlideSource};
pub use offset::{
    CACHE_FILE, CACHE_VERSION, CacheMiss, KERNEL_FILE, KernelDump, OffsetCache, OffsetFinder,
    OffsetReport, OffsetTable, PrecomputedOffsets, SlidOffsets, UnslidOffsets,
};
pub use registry::{AddressRegistry, AnchorVtab};
pub use resolver::{AddressSource, Resolver, ResolverConfig, ResolverConfigBuilder};
