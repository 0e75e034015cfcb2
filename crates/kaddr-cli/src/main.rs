mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use kaddr_core::{Arch, FixedSlide, ResolverConfig};
use tracing_subscriber::EnvFilter;

use commands::hex_utils::parse_hex_address;

#[derive(Parser)]
#[command(name = "kaddr")]
#[command(about = "Kernel address resolver and offset cache")]
struct Args {
    /// Working directory holding config.txt, offsets.dat and kernel.bin
    #[arg(short, long, default_value = ".", env = "KADDR_DIR", global = true)]
    dir: PathBuf,

    /// Target architecture (defaults to the build target's pointer width)
    #[arg(long, global = true)]
    arch: Option<Arch>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct IdentityArgs {
    /// Hardware model (e.g., N102AP); queried from the system when omitted
    #[arg(long)]
    model: Option<String>,

    /// OS build (e.g., 13C75); queried from the system when omitted
    #[arg(long)]
    build: Option<String>,
}

#[derive(ClapArgs)]
struct SlideArgs {
    /// Kernel slide of the current boot, in hex
    #[arg(long, value_parser = parse_hex_address, default_value = "0")]
    slide: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Show the device identity and its registry entry
    Identify {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Resolve the anchor and vtab addresses
    Addresses {
        #[command(flatten)]
        identity: IdentityArgs,
        #[command(flatten)]
        slide: SlideArgs,
    },
    /// Resolve the full offset table, using the cache when possible
    Resolve {
        #[command(flatten)]
        identity: IdentityArgs,
        #[command(flatten)]
        slide: SlideArgs,
        /// Disclosed kernel image to use on a cache miss
        #[arg(long)]
        kernel_image: PathBuf,
        /// Offsets found by the external scanner (JSON)
        #[arg(long)]
        offsets: PathBuf,
        /// Do not write kernel.bin
        #[arg(long)]
        no_kernel_dump: bool,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect or remove the offset cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List the compiled-in anchor/vtab registry
    Registry,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Decode the cache file under a slide
    Show {
        #[command(flatten)]
        slide: SlideArgs,
    },
    /// Delete the cache file
    Clear,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "kaddr=debug" } else { "kaddr=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let arch = args.arch.unwrap_or_else(Arch::native);
    let config = ResolverConfig::builder().dir(&args.dir).arch(arch);

    match args.command {
        Command::Identify { identity } => {
            commands::identify::run(commands::platform(identity.model, identity.build)?, arch)
        }
        Command::Addresses { identity, slide } => commands::addresses::run(
            config.build(),
            commands::platform(identity.model, identity.build)?,
            FixedSlide(slide.slide),
        ),
        Command::Resolve {
            identity,
            slide,
            kernel_image,
            offsets,
            no_kernel_dump,
            output,
        } => commands::resolve::run(
            config.keep_kernel_dump(!no_kernel_dump).build(),
            commands::platform(identity.model, identity.build)?,
            FixedSlide(slide.slide),
            &kernel_image,
            &offsets,
            output.as_deref(),
        ),
        Command::Cache { action } => match action {
            CacheAction::Show { slide } => commands::cache::show(&config.build(), slide.slide),
            CacheAction::Clear => commands::cache::clear(&config.build()),
        },
        Command::Registry => commands::registry::run(arch),
    }
}
