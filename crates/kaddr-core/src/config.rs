//! User-editable anchor/vtab override.
//!
//! The override file holds two `0x`-prefixed hexadecimal addresses, anchor
//! first, separated by whitespace. Anything after the second address is not
//! inspected. Each address must fit the word width of the target
//! architecture. A missing file means "use the registry"; a file that exists but
//! does not parse is an error the operator has to fix.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::arch::Arch;
use crate::error::{Error, Result};
use crate::registry::AnchorVtab;

/// Default override file name inside the working directory
pub const CONFIG_FILE: &str = "config.txt";

pub fn try_load<P: AsRef<Path>>(path: P, arch: Arch) -> Result<Option<AnchorVtab>> {
    let path = path.as_ref();
    debug!("Checking for config file {}...", path.display());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config file, falling back to the registry");
            return Ok(None);
        }
        Err(e) => {
            return Err(Error::MalformedConfig {
                path: path.to_path_buf(),
                reason: format!("unreadable ({})", e),
            });
        }
    };

    let pair = parse(&content, arch).map_err(|reason| Error::MalformedConfig {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!("Anchor: {:#x}, Vtab: {:#x}", pair.anchor, pair.vtab);
    Ok(Some(pair))
}

fn parse(content: &str, arch: Arch) -> std::result::Result<AnchorVtab, String> {
    let mut tokens = content.split_whitespace();
    let anchor = tokens.next().ok_or("missing anchor address")?;
    let vtab = tokens.next().ok_or("missing vtab address")?;

    Ok(AnchorVtab::new(
        parse_word(anchor, arch).map_err(|e| format!("anchor: {}", e))?,
        parse_word(vtab, arch).map_err(|e| format!("vtab: {}", e))?,
    ))
}

fn parse_word(s: &str, arch: Arch) -> std::result::Result<u64, String> {
    let value = parse_address(s)?;
    if value > arch.mask() {
        return Err(format!(
            "'{}' exceeds {}-bit word",
            s,
            arch.word_size() * 8
        ));
    }
    Ok(value)
}

/// Parse a `0x`-prefixed hex address
pub fn parse_address(s: &str) -> std::result::Result<u64, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("'{}' is missing the 0x prefix", s))?;
    u64::from_str_radix(digits, 16).map_err(|e| format!("'{}' is not a hex address ({})", s, e))
}
