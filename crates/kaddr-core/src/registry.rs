//! Compiled-in anchor/vtab registry.
//!
//! Every entry was verified by hand against a dumped kernel. Several models
//! may share one entry when they run the same firmware binary; the aliasing is
//! spelled out per entry rather than inferred.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arch::Arch;
use crate::device::{DeviceIdentity, Model, OsBuild};
use crate::error::{Error, Result};

/// Unslid anchor and vtab addresses for one device/firmware pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorVtab {
    pub anchor: u64,
    pub vtab: u64,
}

impl AnchorVtab {
    pub const fn new(anchor: u64, vtab: u64) -> Self {
        Self { anchor, vtab }
    }
}

/// One row of the static table
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub arch: Arch,
    pub models: &'static [Model],
    pub build: OsBuild,
    pub addresses: AnchorVtab,
}

pub const ENTRIES: &[RegistryEntry] = &[
    RegistryEntry {
        arch: Arch::Arm64,
        models: &[Model::N69AP, Model::N71AP],
        build: OsBuild::V13G34,
        addresses: AnchorVtab::new(0xffffff8004536000, 0xffffff80044ef1f0),
    },
    RegistryEntry {
        arch: Arch::Arm64,
        models: &[Model::N102AP],
        build: OsBuild::V13C75,
        addresses: AnchorVtab::new(0xffffff800453a000, 0xffffff80044f3168),
    },
    RegistryEntry {
        arch: Arch::Arm32,
        models: &[Model::N78AP, Model::N78aAP],
        build: OsBuild::V13B143,
        addresses: AnchorVtab::new(0x800a7b93, 0x803eee50),
    },
    RegistryEntry {
        arch: Arch::Arm32,
        models: &[Model::N78AP, Model::N78aAP],
        build: OsBuild::V13F69,
        addresses: AnchorVtab::new(0x800a744b, 0x803ece94),
    },
];

/// The registry subset applicable to one architecture
#[derive(Debug, Clone)]
pub struct AddressRegistry {
    arch: Arch,
    table: HashMap<DeviceIdentity, AnchorVtab>,
}

impl AddressRegistry {
    pub fn for_arch(arch: Arch) -> Self {
        let table = ENTRIES
            .iter()
            .filter(|entry| entry.arch == arch)
            .flat_map(|entry| {
                entry
                    .models
                    .iter()
                    .map(move |&model| (DeviceIdentity::new(model, entry.build), entry.addresses))
            })
            .collect();

        Self { arch, table }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn lookup(&self, identity: DeviceIdentity) -> Result<AnchorVtab> {
        match self.table.get(&identity) {
            Some(pair) => {
                debug!(
                    "Registry hit for {}: anchor={:#x}, vtab={:#x}",
                    identity, pair.anchor, pair.vtab
                );
                Ok(*pair)
            }
            None => Err(Error::UnsupportedCombination {
                model: identity.model,
                build: identity.build,
                arch: self.arch,
            }),
        }
    }

    /// All known pairings, sorted by build then model name
    pub fn entries(&self) -> Vec<(DeviceIdentity, AnchorVtab)> {
        let mut entries: Vec<_> = self.table.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(identity, _)| (identity.build.as_str(), identity.model.as_str()));
        entries
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
