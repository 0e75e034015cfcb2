use std::fs;
use std::path::Path;

use serde::Serialize;

use super::OffsetTable;
use crate::arch::Arch;
use crate::error::Result;

/// Offset table rendered for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct OffsetReport {
    pub arch: Arch,
    pub slide: String,
    pub slid: Vec<ReportField>,
    pub unslid: Vec<ReportField>,
}

/// One named offset in hex string format
#[derive(Debug, Clone, Serialize)]
pub struct ReportField {
    pub name: &'static str,
    pub value: String,
    /// Value with the slide removed; absent for unslid fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unslid: Option<String>,
}

impl OffsetReport {
    pub fn new(table: &OffsetTable, arch: Arch, slide: u64) -> Self {
        let slid = super::SlidOffsets::NAMES
            .iter()
            .zip(table.slid.values())
            .map(|(&name, value)| ReportField {
                name,
                value: format!("0x{:X}", value),
                unslid: Some(format!("0x{:X}", arch.unslide(value, slide))),
            })
            .collect();

        let unslid = super::UnslidOffsets::NAMES
            .iter()
            .zip(table.unslid.values())
            .map(|(&name, value)| ReportField {
                name,
                value: format!("0x{:X}", value),
                unslid: None,
            })
            .collect();

        Self {
            arch,
            slide: format!("0x{:X}", slide),
            slid,
            unslid,
        }
    }

    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
