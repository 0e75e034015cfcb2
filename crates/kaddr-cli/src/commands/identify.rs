//! Identify command implementation.

use anyhow::Result;
use kaddr_core::{AddressRegistry, Arch, DeviceIdentifier, PlatformInfo};

use super::hex_utils::format_word;

/// Run the identify command
pub fn run(platform: Box<dyn PlatformInfo>, arch: Arch) -> Result<()> {
    let identifier = DeviceIdentifier::new(platform);
    let identity = identifier.identity()?;

    println!(
        "Model:    {} ({})",
        identity.model,
        identity.model.marketing_name()
    );
    println!(
        "Build:    {} (iOS {})",
        identity.build,
        identity.build.ios_version()
    );

    match AddressRegistry::for_arch(arch).lookup(identity) {
        Ok(pair) => {
            println!("Registry: anchor {}", format_word(arch, pair.anchor));
            println!("          vtab   {} (unslid)", format_word(arch, pair.vtab));
        }
        Err(e) => println!("Registry: {}", e),
    }

    Ok(())
}
