use clap::{Parser, Subcommand};
use dyngfx::config::{self, Config};
use dyngfx::generate::{self, FilterMode, GenerateSettings};
use dyngfx::imaging::{
    ConvolutionKernel, Filter, OutputFormat, ResizeRequest, Rotation, RustCodec, Sharpening,
};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Encoding flags shared by every command that writes images.
#[derive(clap::Args, Clone)]
struct EncodeArgs {
    /// Output format (defaults to config, or the output file's extension)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Encoder quality 1-100 (JPEG only)
    #[arg(long)]
    quality: Option<u32>,
}

/// Kernel edge-policy overrides.
#[derive(clap::Args, Clone)]
struct KernelArgs {
    /// Leave pixels within the kernel radius of the border unprocessed
    #[arg(long)]
    exclude_edges: bool,

    /// Convolve fully transparent pixels as well
    #[arg(long)]
    no_preserve_transparency: bool,
}

#[derive(Parser)]
#[command(name = "dyngfx")]
#[command(about = "Resize, sharpen and blur raster graphics with an on-disk cache")]
#[command(long_about = "\
Resize, sharpen and blur raster graphics with an on-disk cache

Generated files are named after the request that produced them and are
reused on later runs when neither the source bytes nor the parameters changed:

  generated/
  ├── .dyngfx-cache.json                      # Cache manifest
  ├── logo-50x0-3fa9c01b2e.png                # logo.png, width 50
  └── logo-50x0-s4i1.00-cw-81d04e7a5c.png     # ... sharpened (radius 4), rotated clockwise

Run 'dyngfx gen-config' to generate a documented dyngfx.toml.")]
#[command(version = env!("DYNGFX_VERSION"))]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit images into a bounding box, optionally rotating and sharpening
    Resize {
        /// Source images
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Target width (0 = derive from aspect ratio)
        #[arg(long, default_value_t = 0)]
        width: u32,

        /// Target height (0 = derive from aspect ratio)
        #[arg(long, default_value_t = 0)]
        height: u32,

        #[arg(long, value_enum, default_value_t = Rotation::None)]
        rotate: Rotation,

        /// Resampling filter (defaults to config)
        #[arg(long, value_enum)]
        filter: Option<Filter>,

        /// Unsharp-mask radius (0 = off; defaults to config)
        #[arg(long)]
        sharpen_radius: Option<u32>,

        /// Unsharp-mask intensity (defaults to config)
        #[arg(long)]
        intensity: Option<f32>,

        /// Output directory (defaults to config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Ignore the cache and regenerate everything
        #[arg(long)]
        no_cache: bool,

        #[command(flatten)]
        encode: EncodeArgs,

        #[command(flatten)]
        kernel: KernelArgs,
    },
    /// Gaussian blur a single image
    Blur {
        source: PathBuf,
        output: PathBuf,

        /// Kernel size (forced odd)
        #[arg(long, default_value_t = 5)]
        size: u32,

        #[command(flatten)]
        encode: EncodeArgs,

        #[command(flatten)]
        kernel: KernelArgs,
    },
    /// Unsharp-mask a single image
    Sharpen {
        source: PathBuf,
        output: PathBuf,

        /// Gaussian radius; the kernel size is twice this
        #[arg(long, default_value_t = 2)]
        radius: u32,

        #[arg(long, default_value_t = 1.0)]
        intensity: f32,

        #[command(flatten)]
        encode: EncodeArgs,

        #[command(flatten)]
        kernel: KernelArgs,
    },
    /// Validate the config file and print the effective settings
    Check,
    /// Print a stock dyngfx.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resize {
            sources,
            width,
            height,
            rotate,
            filter,
            sharpen_radius,
            intensity,
            output,
            no_cache,
            encode,
            kernel,
        } => {
            let config = load_config(&cli.config, &encode)?;
            init_thread_pool(&config.processing);

            let mut settings = GenerateSettings::from_config(&config);
            if let Some(dir) = output {
                settings.output_dir = dir;
            }
            let defaults = config.sharpening();
            let sharpening = Sharpening::new(
                sharpen_radius.unwrap_or(defaults.radius),
                intensity.unwrap_or(defaults.intensity),
            );
            let request = ResizeRequest::new(width, height)
                .with_rotation(rotate)
                .with_filter(filter.unwrap_or(config.resize.filter))
                .with_sharpening(sharpening)
                .with_kernel(kernel_options(&config, &kernel));

            let report =
                generate::generate_all(&RustCodec::new(), &sources, &request, &settings, !no_cache)?;
            for (source, result) in &report.results {
                match result {
                    Ok(outcome) => println!("{} → {}", source.display(), outcome.path().display()),
                    Err(e) => eprintln!("{}: {e}", source.display()),
                }
            }
            println!("Cache: {}", report.cache_stats);
            if report.failures() > 0 {
                return Err(format!("{} of {} images failed", report.failures(), sources.len()).into());
            }
        }
        Command::Blur {
            source,
            output,
            size,
            encode,
            kernel,
        } => {
            let config = load_config(&cli.config, &encode)?;
            init_thread_pool(&config.processing);
            let k = ConvolutionKernel::gaussian(size, config.kernel.center_factor)?
                .with_options(&kernel_options(&config, &kernel));
            let target = encode_target(&config, &encode, &output);
            generate::filter_file(&RustCodec::new(), &source, &output, &k, FilterMode::Blur, target)?;
            println!("{} → {}", source.display(), output.display());
        }
        Command::Sharpen {
            source,
            output,
            radius,
            intensity,
            encode,
            kernel,
        } => {
            let config = load_config(&cli.config, &encode)?;
            init_thread_pool(&config.processing);
            let sharpening = Sharpening::new(radius, intensity);
            let k = ConvolutionKernel::gaussian(sharpening.kernel_size(), config.kernel.center_factor)?
                .with_options(&kernel_options(&config, &kernel));
            let target = encode_target(&config, &encode, &output);
            generate::filter_file(
                &RustCodec::new(),
                &source,
                &output,
                &k,
                FilterMode::Sharpen { intensity },
                target,
            )?;
            println!("{} → {}", source.display(), output.display());
        }
        Command::Check => {
            let config = Config::load(&cli.config)?;
            println!("==> {} is valid", cli.config.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr log subscriber. Warnings by default, more with `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the config and apply command-line encoding overrides.
fn load_config(path: &Path, encode: &EncodeArgs) -> Result<Config, config::ConfigError> {
    let mut config = Config::load(path)?;
    if let Some(format) = encode.format {
        config.output.format = format;
    }
    if let Some(quality) = encode.quality {
        config.output.quality = quality;
    }
    config.validate()?;
    Ok(config)
}

fn kernel_options(config: &Config, args: &KernelArgs) -> dyngfx::imaging::KernelOptions {
    let mut options = config.kernel_options();
    if args.exclude_edges {
        options.include_edges = false;
    }
    if args.no_preserve_transparency {
        options.preserve_transparency = false;
    }
    options
}

/// Format and quality for a single-file command: `--format`, then the output
/// extension, then the config.
fn encode_target(
    config: &Config,
    encode: &EncodeArgs,
    output: &Path,
) -> (OutputFormat, dyngfx::imaging::Quality) {
    let format = encode
        .format
        .or_else(|| {
            output
                .extension()
                .and_then(|e| e.to_str())
                .and_then(OutputFormat::from_extension)
        })
        .unwrap_or(config.output.format);
    (format, config.quality())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
