//! Addresses command implementation.

use anyhow::Result;
use kaddr_core::{PlatformInfo, Resolver, ResolverConfig, SlideSource};

use super::hex_utils::format_word;

/// Run the addresses command
pub fn run<S: SlideSource>(
    config: ResolverConfig,
    platform: Box<dyn PlatformInfo>,
    slide: S,
) -> Result<()> {
    let arch = config.arch;
    let resolver = Resolver::new(config, platform, slide);
    let source = resolver.address_source()?;
    let anchor = resolver.anchor()?;
    let vtab = resolver.vtab()?;
    let kslide = resolver.kernel_slide()?;

    println!("Source: {}", source);
    println!("Slide:  {}", format_word(arch, kslide));
    println!("Anchor: {}", format_word(arch, anchor));
    println!(
        "Vtab:   {} (unslid {})",
        format_word(arch, vtab),
        format_word(arch, arch.unslide(vtab, kslide))
    );

    Ok(())
}
