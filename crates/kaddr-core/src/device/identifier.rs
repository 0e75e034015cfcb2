//! Memoized device identification.

use std::cell::OnceCell;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Model, OsBuild, PlatformInfo};
use crate::error::{Error, Result};

/// Composite registry key: one hardware model on one firmware build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub model: Model,
    pub build: OsBuild,
}

impl DeviceIdentity {
    pub fn new(model: Model, build: OsBuild) -> Self {
        Self { model, build }
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) on {} (iOS {})",
            self.model,
            self.model.marketing_name(),
            self.build,
            self.build.ios_version()
        )
    }
}

/// Resolves the running device's identity once and remembers it.
///
/// Each platform string is queried at most once per identifier. A failed
/// query or an unknown string is not cached, but it is fatal to resolution
/// anyway.
pub struct DeviceIdentifier<P> {
    platform: P,
    model: OnceCell<Model>,
    build: OnceCell<OsBuild>,
}

impl<P: PlatformInfo> DeviceIdentifier<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            model: OnceCell::new(),
            build: OnceCell::new(),
        }
    }

    pub fn identify_model(&self) -> Result<Model> {
        if let Some(model) = self.model.get() {
            return Ok(*model);
        }

        let raw = self.platform.hw_model()?;
        debug!("Model: {}", raw);
        let model = Model::from_str(&raw).map_err(|_| Error::UnrecognizedDevice(raw))?;
        Ok(*self.model.get_or_init(|| model))
    }

    pub fn identify_os_build(&self) -> Result<OsBuild> {
        if let Some(build) = self.build.get() {
            return Ok(*build);
        }

        let raw = self.platform.os_build()?;
        debug!("OS build: {}", raw);
        let build = OsBuild::from_str(&raw).map_err(|_| Error::UnrecognizedOsVersion(raw))?;
        Ok(*self.build.get_or_init(|| build))
    }

    pub fn identity(&self) -> Result<DeviceIdentity> {
        Ok(DeviceIdentity::new(
            self.identify_model()?,
            self.identify_os_build()?,
        ))
    }
}
