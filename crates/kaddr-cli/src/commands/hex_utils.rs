//! Hex address parsing and formatting for command-line values.

use anyhow::{Result, anyhow};
use kaddr_core::Arch;

/// Parse a hex value given on the command line, `0x` prefix optional.
///
/// Used for the kernel slide, which operators copy from other tools in
/// either form.
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| anyhow!("Invalid hex value '{}': {}", s, e))
}

/// Format an address zero-padded to the word width of `arch`
pub fn format_word(arch: Arch, value: u64) -> String {
    match arch {
        Arch::Arm32 => format!("0x{:08x}", value),
        Arch::Arm64 => format!("0x{:016x}", value),
    }
}
