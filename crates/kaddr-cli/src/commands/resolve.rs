//! Resolve command implementation.

use std::path::Path;

use anyhow::Result;
use kaddr_core::{
    FileDumper, OffsetReport, PlatformInfo, PrecomputedOffsets, Resolver, ResolverConfig,
    SlideSource,
};
use tracing::info;

/// Run the resolve command
pub fn run<S: SlideSource>(
    config: ResolverConfig,
    platform: Box<dyn PlatformInfo>,
    slide: S,
    kernel_image: &Path,
    offsets_json: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let arch = config.arch;
    let mut resolver = Resolver::new(config, platform, slide);
    let mut dumper = FileDumper::new(kernel_image);
    let finder = PrecomputedOffsets::new(offsets_json);

    let kslide = resolver.kernel_slide()?;
    let offsets = resolver.init(&mut dumper, &finder)?;
    let report = OffsetReport::new(offsets, arch, kslide);

    if let Some(output_path) = output {
        report.save(output_path)?;
        info!("Report saved to {}", output_path.display());
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
