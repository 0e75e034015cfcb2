//! Registry command implementation.

use anyhow::Result;
use kaddr_core::{AddressRegistry, Arch};

use super::hex_utils::format_word;

/// List every registry entry for `arch`
pub fn run(arch: Arch) -> Result<()> {
    let registry = AddressRegistry::for_arch(arch);
    println!("{} entries for {}", registry.len(), arch);
    println!();

    for (identity, pair) in registry.entries() {
        println!(
            "{:<8} {:<7} {:<16} anchor {}  vtab {}",
            identity.model.as_str(),
            identity.build.as_str(),
            identity.model.marketing_name(),
            format_word(arch, pair.anchor),
            format_word(arch, pair.vtab)
        );
    }

    Ok(())
}
