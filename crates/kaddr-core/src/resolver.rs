//! Top-level offset resolution.
//!
//! `Resolver` owns everything that is resolved once and then reused: the
//! device identity, the anchor and vtab addresses and the offset table. It
//! tries the on-disk cache first and falls back to dumping and scanning the
//! kernel, after which it refreshes the cache.
//!
//! ## Example
//!
//! ```ignore
//! use kaddr_core::{FileDumper, FixedPlatform, FixedSlide, PrecomputedOffsets};
//! use kaddr_core::{Resolver, ResolverConfig};
//!
//! let config = ResolverConfig::builder().dir("/var/mobile/kaddr").build();
//! let platform = FixedPlatform::new("N102AP", "13C75");
//! let mut resolver = Resolver::new(config, platform, FixedSlide(0x0420_0000));
//!
//! let mut dumper = FileDumper::new("/tmp/kernel.raw");
//! let finder = PrecomputedOffsets::new("/tmp/offsets.json");
//! let offsets = resolver.init(&mut dumper, &finder)?;
//! ```

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::arch::Arch;
use crate::config::{self, CONFIG_FILE};
use crate::device::{DeviceIdentifier, DeviceIdentity, PlatformInfo};
use crate::error::{Error, Result};
use crate::kernel::{KernelDumper, SlideSource};
use crate::offset::{CACHE_FILE, KERNEL_FILE, OffsetCache, OffsetFinder, OffsetTable};
use crate::registry::{AddressRegistry, AnchorVtab};

/// Where the resolver keeps its files and which architecture it targets
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Working directory holding the config, cache and dump files
    pub dir: PathBuf,
    pub arch: Arch,
    pub config_file: String,
    pub cache_file: String,
    pub kernel_file: String,
    /// Write each fresh kernel dump to disk
    pub keep_kernel_dump: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            arch: Arch::native(),
            config_file: CONFIG_FILE.to_string(),
            cache_file: CACHE_FILE.to_string(),
            kernel_file: KERNEL_FILE.to_string(),
            keep_kernel_dump: true,
        }
    }
}

impl ResolverConfig {
    /// Create a new configuration builder
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(&self.config_file)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.dir.join(&self.cache_file)
    }

    pub fn kernel_path(&self) -> PathBuf {
        self.dir.join(&self.kernel_file)
    }
}

/// Builder for ResolverConfig
#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    dir: Option<PathBuf>,
    arch: Option<Arch>,
    config_file: Option<String>,
    cache_file: Option<String>,
    kernel_file: Option<String>,
    keep_kernel_dump: Option<bool>,
}

impl ResolverConfigBuilder {
    /// Set the working directory
    pub fn dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    pub fn config_file<S: Into<String>>(mut self, name: S) -> Self {
        self.config_file = Some(name.into());
        self
    }

    pub fn cache_file<S: Into<String>>(mut self, name: S) -> Self {
        self.cache_file = Some(name.into());
        self
    }

    pub fn kernel_file<S: Into<String>>(mut self, name: S) -> Self {
        self.kernel_file = Some(name.into());
        self
    }

    /// Enable or disable writing the diagnostic kernel dump
    pub fn keep_kernel_dump(mut self, enabled: bool) -> Self {
        self.keep_kernel_dump = Some(enabled);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ResolverConfig {
        let default = ResolverConfig::default();
        ResolverConfig {
            dir: self.dir.unwrap_or(default.dir),
            arch: self.arch.unwrap_or(default.arch),
            config_file: self.config_file.unwrap_or(default.config_file),
            cache_file: self.cache_file.unwrap_or(default.cache_file),
            kernel_file: self.kernel_file.unwrap_or(default.kernel_file),
            keep_kernel_dump: self.keep_kernel_dump.unwrap_or(default.keep_kernel_dump),
        }
    }
}

/// Origin of the anchor/vtab pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSource {
    /// Operator override file
    Override(PathBuf),
    /// Compiled-in registry entry for this device
    Registry(DeviceIdentity),
}

impl std::fmt::Display for AddressSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override(path) => write!(f, "{}", path.display()),
            Self::Registry(identity) => write!(f, "registry ({})", identity),
        }
    }
}

/// Resolves and holds the kernel offsets for one process.
///
/// Not `Sync`: every memoized value is set at most once through `&self` or
/// `&mut self` on a single thread.
pub struct Resolver<P, S> {
    config: ResolverConfig,
    identifier: DeviceIdentifier<P>,
    registry: AddressRegistry,
    slide: S,
    overrides: OnceCell<Option<AnchorVtab>>,
    anchor: OnceCell<u64>,
    vtab: OnceCell<u64>,
    offsets: Option<OffsetTable>,
}

impl<P: PlatformInfo, S: SlideSource> Resolver<P, S> {
    pub fn new(config: ResolverConfig, platform: P, slide: S) -> Self {
        let registry = AddressRegistry::for_arch(config.arch);
        Self {
            config,
            identifier: DeviceIdentifier::new(platform),
            registry,
            slide,
            overrides: OnceCell::new(),
            anchor: OnceCell::new(),
            vtab: OnceCell::new(),
            offsets: None,
        }
    }

    pub fn identity(&self) -> Result<DeviceIdentity> {
        self.identifier.identity()
    }

    pub fn kernel_slide(&self) -> Result<u64> {
        self.slide.kernel_slide()
    }

    pub fn cache(&self) -> OffsetCache {
        OffsetCache::new(self.config.cache_path(), self.config.arch)
    }

    /// Anchor address inside the dumped image; never slid
    pub fn anchor(&self) -> Result<u64> {
        if let Some(anchor) = self.anchor.get() {
            return Ok(*anchor);
        }

        debug!("Getting anchor address...");
        let anchor = self.lookup_pair()?.anchor;
        debug!("Got anchor: {:#x}", anchor);
        Ok(*self.anchor.get_or_init(|| anchor))
    }

    /// Vtab address in live kernel memory, slid by the current slide
    pub fn vtab(&self) -> Result<u64> {
        if let Some(vtab) = self.vtab.get() {
            return Ok(*vtab);
        }

        debug!("Getting OSString vtab address...");
        let unslid = self.lookup_pair()?.vtab;
        debug!("Got vtab (unslid): {:#x}", unslid);
        let vtab = self.config.arch.slide(unslid, self.slide.kernel_slide()?);
        Ok(*self.vtab.get_or_init(|| vtab))
    }

    /// Override file first, registry second
    fn lookup_pair(&self) -> Result<AnchorVtab> {
        if let Some(pair) = self.override_pair()? {
            return Ok(pair);
        }
        debug!("No override, consulting the registry...");
        self.registry.lookup(self.identifier.identity()?)
    }

    /// Where `anchor` and `vtab` come from for this device
    pub fn address_source(&self) -> Result<AddressSource> {
        if self.override_pair()?.is_some() {
            return Ok(AddressSource::Override(self.config.config_path()));
        }
        Ok(AddressSource::Registry(self.identifier.identity()?))
    }

    fn override_pair(&self) -> Result<Option<AnchorVtab>> {
        if let Some(pair) = self.overrides.get() {
            return Ok(*pair);
        }
        let loaded = config::try_load(self.config.config_path(), self.config.arch)?;
        Ok(*self.overrides.get_or_init(|| loaded))
    }

    pub fn is_initialized(&self) -> bool {
        self.offsets.is_some()
    }

    /// The resolved table; only available after a successful `init`
    pub fn offsets(&self) -> Result<&OffsetTable> {
        self.offsets.as_ref().ok_or(Error::NotInitialized)
    }

    /// Populate the offset table, at most once per resolver.
    ///
    /// Later calls return the table from the first successful call without
    /// touching the cache, the dumper or the finder.
    pub fn init<D, F>(&mut self, dumper: &mut D, finder: &F) -> Result<&OffsetTable>
    where
        D: KernelDumper + ?Sized,
        F: OffsetFinder + ?Sized,
    {
        if self.offsets.is_none() {
            debug!("Initializing offsets...");
            let table = self.resolve_offsets(dumper, finder)?;
            trace_offsets(&table);
            self.offsets = Some(table);
        }
        self.offsets()
    }

    fn resolve_offsets<D, F>(&self, dumper: &mut D, finder: &F) -> Result<OffsetTable>
    where
        D: KernelDumper + ?Sized,
        F: OffsetFinder + ?Sized,
    {
        let cache = self.cache();
        let slide = self.slide.kernel_slide()?;

        debug!("Checking for offsets cache file {}...", cache.path().display());
        match cache.load(slide) {
            Ok(table) => {
                info!("Loaded offsets from cache, skipping kernel dumping");
                return Ok(table);
            }
            Err(miss) => debug!("Cache not used: {}", miss),
        }

        // Resolve the anchor before the expensive part so an unsupported
        // device fails without dumping anything.
        let anchor = self.anchor()?;

        debug!("No offsets loaded so far, dumping the kernel...");
        let table = {
            let dump = dumper.dump_kernel()?;
            debug!("Dumped {} bytes of kernel", dump.len());
            if self.config.keep_kernel_dump {
                save_kernel_dump(&dump, &self.config.kernel_path());
            }
            finder.find_all_offsets(&dump, anchor)?
        };

        if let Some((name, value)) = table.field_exceeding(self.config.arch) {
            return Err(Error::OffsetSearchFailed(format!(
                "{} = {:#x} does not fit one {} word",
                name, value, self.config.arch
            )));
        }

        if let Err(e) = cache.save(&table, slide) {
            warn!(
                "Failed to create offsets cache file {}: {}",
                cache.path().display(),
                e
            );
        }
        Ok(table)
    }
}

fn save_kernel_dump(dump: &crate::offset::KernelDump, path: &Path) {
    match dump.save(path) {
        Ok(()) => debug!("Wrote dumped kernel to {}", path.display()),
        Err(e) => warn!("Failed to create kernel file {}: {}", path.display(), e),
    }
}

fn trace_offsets(table: &OffsetTable) {
    debug!("Offsets:");
    for (name, value) in table.named_fields() {
        debug!("{:<34} = {:#x}", name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{FixedPlatform, Model, OsBuild};
    use crate::kernel::FixedSlide;
    use crate::offset::{KernelDump, sample_table};
    use std::fs;
    use tempfile::TempDir;

    struct CountingDumper {
        image: Vec<u8>,
        calls: usize,
    }

    impl CountingDumper {
        fn new() -> Self {
            Self {
                image: vec![0xcf, 0xfa, 0xed, 0xfe, 0x0c, 0x00, 0x00, 0x01],
                calls: 0,
            }
        }
    }

    impl KernelDumper for CountingDumper {
        fn dump_kernel(&mut self) -> Result<KernelDump> {
            self.calls += 1;
            Ok(KernelDump::new(self.image.clone()))
        }
    }

    struct FailingDumper;

    impl KernelDumper for FailingDumper {
        fn dump_kernel(&mut self) -> Result<KernelDump> {
            Err(Error::KernelDump("read primitive failed".to_string()))
        }
    }

    /// Finder returning the sample table rebased onto `slide`
    fn finder_for(slide: u64) -> impl Fn(&KernelDump, u64) -> Result<OffsetTable> {
        move |_: &KernelDump, _: u64| Ok(sample_table().slid_by(Arch::Arm64, slide))
    }

    fn unused_finder(_: &KernelDump, _: u64) -> Result<OffsetTable> {
        panic!("finder must not run");
    }

    fn resolver(
        dir: &TempDir,
        model: &str,
        build: &str,
        slide: u64,
    ) -> Resolver<FixedPlatform, FixedSlide> {
        let config = ResolverConfig::builder()
            .dir(dir.path())
            .arch(Arch::Arm64)
            .build();
        Resolver::new(config, FixedPlatform::new(model, build), FixedSlide(slide))
    }

    #[test]
    fn test_ipod_touch_6g_anchor_from_registry() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, "N102AP", "13C75", 0x0420_0000);

        assert_eq!(
            resolver.identity().unwrap(),
            DeviceIdentity::new(Model::N102AP, OsBuild::V13C75)
        );
        assert_eq!(resolver.anchor().unwrap(), 0xffffff800453a000);
    }

    #[test]
    fn test_vtab_is_slid_and_anchor_is_not() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, "N69AP", "13G34", 0x0420_0000);

        assert_eq!(resolver.anchor().unwrap(), 0xffffff8004536000);
        assert_eq!(resolver.vtab().unwrap(), 0xffffff80044ef1f0 + 0x0420_0000);
        // Memoized values are not slid a second time
        assert_eq!(resolver.vtab().unwrap(), 0xffffff80044ef1f0 + 0x0420_0000);
    }

    #[test]
    fn test_config_override_wins_over_registry() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "0xffffff8004500000\n0xffffff80044e0000\n",
        )
        .unwrap();
        let resolver = resolver(&dir, "N102AP", "13C75", 0x2000);

        assert_eq!(resolver.anchor().unwrap(), 0xffffff8004500000);
        assert_eq!(resolver.vtab().unwrap(), 0xffffff80044e2000);
    }

    #[test]
    fn test_config_override_covers_devices_missing_from_registry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "0x1000 0x2000").unwrap();
        let resolver = resolver(&dir, "J96AP", "13E233", 0x10);

        assert_eq!(resolver.anchor().unwrap(), 0x1000);
        assert_eq!(resolver.vtab().unwrap(), 0x2010);
    }

    #[test]
    fn test_address_source() {
        let dir = TempDir::new().unwrap();
        let from_registry = resolver(&dir, "N102AP", "13C75", 0);
        assert_eq!(
            from_registry.address_source().unwrap(),
            AddressSource::Registry(DeviceIdentity::new(Model::N102AP, OsBuild::V13C75))
        );

        fs::write(dir.path().join(CONFIG_FILE), "0x1000 0x2000").unwrap();
        let from_override = resolver(&dir, "N102AP", "13C75", 0);
        assert_eq!(
            from_override.address_source().unwrap(),
            AddressSource::Override(dir.path().join(CONFIG_FILE))
        );
    }

    #[test]
    fn test_oversized_override_rejected_on_arm32() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "0x1800a7b93 0x1803eee50").unwrap();
        let config = ResolverConfig::builder()
            .dir(dir.path())
            .arch(Arch::Arm32)
            .build();
        let resolver = Resolver::new(
            config,
            FixedPlatform::new("N78AP", "13F69"),
            FixedSlide(0x1000),
        );

        assert!(matches!(resolver.anchor(), Err(Error::MalformedConfig { .. })));
        assert!(matches!(resolver.vtab(), Err(Error::MalformedConfig { .. })));
    }

    #[test]
    fn test_malformed_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "anchor=0x1000").unwrap();
        let resolver = resolver(&dir, "N102AP", "13C75", 0);

        assert!(matches!(
            resolver.anchor(),
            Err(Error::MalformedConfig { .. })
        ));
    }

    #[test]
    fn test_unsupported_combination_without_override_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver(&dir, "N94AP", "13A340", 0);

        assert!(matches!(
            resolver.anchor(),
            Err(Error::UnsupportedCombination { .. })
        ));

        let mut dumper = CountingDumper::new();
        assert!(resolver.init(&mut dumper, &unused_finder).is_err());
        assert_eq!(dumper.calls, 0);
        assert!(!resolver.is_initialized());
    }

    #[test]
    fn test_unrecognized_device_is_fatal() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, "iPhone8,1", "13C75", 0);
        assert!(matches!(
            resolver.vtab(),
            Err(Error::UnrecognizedDevice(ref raw)) if raw == "iPhone8,1"
        ));
    }

    #[test]
    fn test_offsets_unavailable_before_init() {
        let dir = TempDir::new().unwrap();
        let resolver = resolver(&dir, "N102AP", "13C75", 0);
        assert!(matches!(resolver.offsets(), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_cold_init_dumps_scans_and_persists() {
        let dir = TempDir::new().unwrap();
        let slide = 0x0420_0000;
        let mut resolver = resolver(&dir, "N102AP", "13C75", slide);
        let mut dumper = CountingDumper::new();

        let table = *resolver.init(&mut dumper, &finder_for(slide)).unwrap();
        assert_eq!(table, sample_table().slid_by(Arch::Arm64, slide));
        assert_eq!(dumper.calls, 1);

        // Diagnostic dump and slide-free cache were both written
        assert_eq!(fs::read(dir.path().join(KERNEL_FILE)).unwrap(), dumper.image);
        let cached = resolver.cache().load(0).unwrap();
        assert_eq!(cached, sample_table());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver(&dir, "N102AP", "13C75", 0x1000);
        let mut dumper = CountingDumper::new();

        let first = *resolver.init(&mut dumper, &finder_for(0x1000)).unwrap();
        fs::remove_file(dir.path().join(CACHE_FILE)).unwrap();
        let second = *resolver.init(&mut dumper, &unused_finder).unwrap();

        assert_eq!(first, second);
        assert_eq!(dumper.calls, 1);
        assert_eq!(*resolver.offsets().unwrap(), first);
    }

    #[test]
    fn test_warm_init_uses_cache_under_new_slide() {
        let dir = TempDir::new().unwrap();
        {
            let mut first_boot = resolver(&dir, "N102AP", "13C75", 0x1000);
            first_boot
                .init(&mut CountingDumper::new(), &finder_for(0x1000))
                .unwrap();
        }

        // Unknown identity proves the warm path never consults the registry
        let mut second_boot = resolver(&dir, "unknown", "unknown", 0x5000);
        let table = *second_boot.init(&mut FailingDumper, &unused_finder).unwrap();

        assert_eq!(table, sample_table().slid_by(Arch::Arm64, 0x5000));
        assert_eq!(table.unslid, sample_table().unslid);
    }

    #[test]
    fn test_outdated_cache_is_regenerated() {
        let dir = TempDir::new().unwrap();
        let cache_path = dir.path().join(CACHE_FILE);
        let mut stale = 2u64.to_le_bytes().to_vec();
        sample_table().encode(Arch::Arm64, &mut stale);
        fs::write(&cache_path, &stale).unwrap();

        let mut resolver = resolver(&dir, "N102AP", "13C75", 0x3000);
        let mut dumper = CountingDumper::new();
        resolver.init(&mut dumper, &finder_for(0x3000)).unwrap();

        assert_eq!(dumper.calls, 1);
        assert_eq!(fs::read(&cache_path).unwrap()[..8], 1u64.to_le_bytes());
    }

    #[test]
    fn test_truncated_cache_is_regenerated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CACHE_FILE), 1u64.to_le_bytes()).unwrap();

        let mut resolver = resolver(&dir, "N102AP", "13C75", 0);
        let mut dumper = CountingDumper::new();
        resolver.init(&mut dumper, &finder_for(0)).unwrap();
        assert_eq!(dumper.calls, 1);
    }

    #[test]
    fn test_persistence_failures_are_not_fatal() {
        let dir = TempDir::new().unwrap();
        let config = ResolverConfig::builder()
            .dir(dir.path())
            .arch(Arch::Arm64)
            .cache_file("missing/offsets.dat")
            .kernel_file("missing/kernel.bin")
            .build();
        let mut resolver = Resolver::new(
            config,
            FixedPlatform::new("N102AP", "13C75"),
            FixedSlide(0x1000),
        );

        let table = *resolver
            .init(&mut CountingDumper::new(), &finder_for(0x1000))
            .unwrap();
        assert_eq!(table, sample_table().slid_by(Arch::Arm64, 0x1000));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_arm32_rejects_offsets_wider_than_word() {
        let dir = TempDir::new().unwrap();
        let config = ResolverConfig::builder()
            .dir(dir.path())
            .arch(Arch::Arm32)
            .build();
        let mut resolver = Resolver::new(
            config,
            FixedPlatform::new("N78AP", "13F69"),
            FixedSlide(0x1000),
        );

        // 64-bit kernel addresses cannot be live addresses on a 32-bit kernel
        let wide = |_: &KernelDump, _: u64| -> Result<OffsetTable> { Ok(sample_table()) };
        let err = resolver.init(&mut CountingDumper::new(), &wide).unwrap_err();
        assert!(matches!(
            err,
            Error::OffsetSearchFailed(ref msg) if msg.contains("gadget_load_x20_x19")
        ));
        assert!(!resolver.is_initialized());
        assert!(!dir.path().join(CACHE_FILE).exists());
    }

    #[test]
    fn test_arm32_cold_and_warm_boot_agree() {
        let dir = TempDir::new().unwrap();
        let narrow = sample_table().slid_by(Arch::Arm32, 0x1000);
        let config = || {
            ResolverConfig::builder()
                .dir(dir.path())
                .arch(Arch::Arm32)
                .build()
        };

        let mut cold = Resolver::new(
            config(),
            FixedPlatform::new("N78AP", "13F69"),
            FixedSlide(0x1000),
        );
        let finder = move |_: &KernelDump, _: u64| -> Result<OffsetTable> { Ok(narrow) };
        let live = *cold.init(&mut CountingDumper::new(), &finder).unwrap();

        let mut warm = Resolver::new(
            config(),
            FixedPlatform::new("N78AP", "13F69"),
            FixedSlide(0x1000),
        );
        let cached = *warm.init(&mut FailingDumper, &unused_finder).unwrap();
        assert_eq!(cached, live);
    }

    #[test]
    fn test_kernel_dump_can_be_skipped() {
        let dir = TempDir::new().unwrap();
        let config = ResolverConfig::builder()
            .dir(dir.path())
            .arch(Arch::Arm64)
            .keep_kernel_dump(false)
            .build();
        let mut resolver = Resolver::new(
            config,
            FixedPlatform::new("N102AP", "13C75"),
            FixedSlide(0),
        );

        resolver
            .init(&mut CountingDumper::new(), &finder_for(0))
            .unwrap();
        assert!(!dir.path().join(KERNEL_FILE).exists());
        assert!(dir.path().join(CACHE_FILE).exists());
    }

    #[test]
    fn test_dump_failure_leaves_resolver_uninitialized() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver(&dir, "N102AP", "13C75", 0);

        let err = resolver.init(&mut FailingDumper, &unused_finder).unwrap_err();
        assert!(matches!(err, Error::KernelDump(_)));
        assert!(!resolver.is_initialized());
        assert!(!dir.path().join(CACHE_FILE).exists());
    }

    #[test]
    fn test_finder_receives_unslid_anchor() {
        let dir = TempDir::new().unwrap();
        let mut resolver = resolver(&dir, "N102AP", "13C75", 0x0420_0000);
        let finder = |dump: &KernelDump, anchor: u64| -> Result<OffsetTable> {
            assert_eq!(anchor, 0xffffff800453a000);
            assert_eq!(dump.len(), 8);
            Ok(sample_table())
        };

        resolver.init(&mut CountingDumper::new(), &finder).unwrap();
    }
}
