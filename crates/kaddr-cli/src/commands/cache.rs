//! Cache command implementation.

use anyhow::Result;
use kaddr_core::{CACHE_VERSION, OffsetCache, OffsetReport, ResolverConfig};

/// Decode the cache file under `slide` and print it
pub fn show(config: &ResolverConfig, slide: u64) -> Result<()> {
    let cache = OffsetCache::new(config.cache_path(), config.arch);
    println!(
        "Cache: {} (format version {}, {})",
        cache.path().display(),
        CACHE_VERSION,
        config.arch
    );

    match cache.load(slide) {
        Ok(table) => {
            let report = OffsetReport::new(&table, config.arch, slide);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Err(miss) => println!("Not usable: {}", miss),
    }

    Ok(())
}

/// Remove the cache file so the next run rescans the kernel
pub fn clear(config: &ResolverConfig) -> Result<()> {
    let cache = OffsetCache::new(config.cache_path(), config.arch);
    if cache.clear()? {
        println!("Removed {}", cache.path().display());
    } else {
        println!("No cache at {}", cache.path().display());
    }
    Ok(())
}
