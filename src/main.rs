mod logging;

use clap::{Parser, Subcommand};
use picturize::cache::VariantCache;
use picturize::imaging::RustBackend;
use picturize::{config, generate, output, picture};
use std::path::{Path, PathBuf};

/// Shared flags for commands that produce variants.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Ignore cached variants and re-encode everything (the cache is still refreshed)
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "picturize")]
#[command(about = "Rewrite document images into cached, responsive <picture> markup")]
#[command(long_about = "\
Rewrite document images into cached, responsive <picture> markup

Every relative image in a markdown document becomes a <picture> element with
one <source> per configured format, listing resized copies at each configured
width, plus a small fallback <img>.

Content structure:

  content/
  ├── config.toml          # Optional, overrides stock defaults
  ├── index.md             # Becomes index.html
  ├── cat.jpg              # Referenced as ![A cat](cat.jpg)
  └── blog/
      ├── post.md          # Becomes blog/post.html
      └── diagram.svg      # Not resized; copied next to the page

Variants are named {base}.{hash}.{width}.{quality}.{format}. The hash covers
the source bytes, so a cached file with the right name is always current.

Run 'picturize gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory (overrides `out_dir` in config.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Variant cache directory (overrides `cache_dir` in config.toml)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Log cache decisions and other debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every markdown document into an HTML page with responsive images
    Build(CacheArgs),
    /// Build the <picture> fragment for a single image and print it
    Picture {
        /// Source image file
        image: PathBuf,
        /// Alternative text for the fallback <img>
        #[arg(long)]
        alt: Option<String>,
        /// Print the fragment and variant statuses as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        cache: CacheArgs,
    },
    /// Validate config.toml without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Build(ref cache_args) => {
            let site_config = load_config(&cli)?;
            init_thread_pool(&site_config.processing);

            println!("==> Building {}", cli.source.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let summary =
                generate::build_site(&cli.source, &site_config, !cache_args.no_cache, Some(tx));
            printer.join().ok();
            let summary = summary?;
            output::print_build_summary(&summary);
            println!("==> Build complete: {}", site_config.out_dir);
        }
        Command::Picture {
            ref image,
            ref alt,
            json,
            ref cache,
        } => {
            let site_config = load_config(&cli)?;
            init_thread_pool(&site_config.processing);

            let variant_cache = VariantCache::for_config(&site_config, !cache.no_cache);
            variant_cache.ensure_dirs()?;
            let built = picture::build_picture(
                &RustBackend::new(),
                &site_config,
                &variant_cache,
                image,
                alt.as_deref(),
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&built)?);
            } else {
                println!("{}", maud::Render::render(&built.picture).into_string());
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let resolved = config::load_config(&cli.source)?;
            output::print_config_warnings(&resolved.warnings);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` from the source directory and apply CLI overrides.
///
/// Shape warnings are logged, never fatal.
fn load_config(cli: &Cli) -> Result<config::Config, config::ConfigError> {
    let resolved = config::load_config(&cli.source)?;
    for warning in &resolved.warnings {
        tracing::warn!("{}", warning);
    }
    let mut site_config = resolved.config;
    if let Some(out) = &cli.output {
        site_config.out_dir = path_string(out);
    }
    if let Some(cache_dir) = &cli.cache_dir {
        site_config.cache_dir = path_string(cache_dir);
    }
    Ok(site_config)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
