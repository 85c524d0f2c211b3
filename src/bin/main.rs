//! Relief Baker CLI
//!
//! Reconstruct height maps from normal map textures.

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use relief_baker::{
    encode_normal_map, load_normal_map, normal_field, save_height_map, slope_field, Method,
    Reconstructor, ReliefConfig, TexelPosition,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "relief-baker")]
#[command(author, version, about = "Reconstruct height maps from normal map textures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake height maps from one or more normal maps
    Bake {
        /// Input normal map images
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Directory for the `<name>_height.png` outputs
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Integration method (overrides the config file)
        #[arg(short, long, value_enum)]
        method: Option<MethodArg>,

        /// Anchor texel for the anchored cross-scan, as X,Y
        #[arg(long, value_parser = parse_anchor)]
        anchor: Option<TexelPosition>,

        /// Constant term pinned on the polynomial fit
        #[arg(long)]
        constant: Option<f32>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fail instead of falling back to cross-scan when the fit is unusable
        #[arg(long)]
        no_fallback: bool,
    },

    /// Re-encode a normal map through the slope field (visual round-trip check)
    Preview {
        /// Input normal map image
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the default configuration as JSON
    Config,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MethodArg {
    /// Global polynomial least-squares fit (small tiles only)
    Fit,
    /// Cross-scan from the top-left texel
    CrossScan,
    /// Cross-scan from the --anchor texel
    Anchored,
}

fn parse_anchor(s: &str) -> Result<TexelPosition, String> {
    let parts: Vec<&str> = s.splitn(2, ',').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid anchor format: '{}'. Use X,Y", s));
    }
    let x = parts[0]
        .trim()
        .parse()
        .map_err(|e| format!("Invalid anchor x '{}': {}", parts[0], e))?;
    let y = parts[1]
        .trim()
        .parse()
        .map_err(|e| format!("Invalid anchor y '{}': {}", parts[1], e))?;
    Ok(TexelPosition::new(x, y))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bake {
            input,
            output_dir,
            method,
            anchor,
            constant,
            config,
            no_fallback,
        } => {
            let config = build_config(config.as_deref(), method, anchor, constant, no_fallback)?;
            bake(&input, &output_dir, config)?;
        }
        Commands::Preview { input, output } => {
            preview(&input, &output)?;
        }
        Commands::Config => {
            println!("{}", ReliefConfig::default().to_json_pretty()?);
        }
    }

    Ok(())
}

fn build_config(
    path: Option<&Path>,
    method: Option<MethodArg>,
    anchor: Option<TexelPosition>,
    constant: Option<f32>,
    no_fallback: bool,
) -> Result<ReliefConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            ReliefConfig::from_json_file(path)?
        }
        None => ReliefConfig::default(),
    };

    if let Some(method) = method {
        config.method = match method {
            MethodArg::Fit => Method::Fit,
            MethodArg::CrossScan => Method::CrossScan,
            MethodArg::Anchored => {
                let a = anchor.unwrap_or_default();
                Method::Anchored { x: a.x, y: a.y }
            }
        };
    } else if let Some(a) = anchor {
        config.method = Method::Anchored { x: a.x, y: a.y };
    }
    if let Some(constant) = constant {
        config.fit_constant = constant;
    }
    if no_fallback {
        config.fallback_to_cross_scan = false;
    }
    config.validate()?;
    Ok(config)
}

fn bake(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: ReliefConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;

    info!("Baking with config:");
    info!("  - Method: {:?}", config.method);
    if config.method == Method::Fit {
        info!("  - Fit constant: {}", config.fit_constant);
        info!("  - Fit texel limit: {}", config.fit_texel_limit);
        info!("  - Fallback to cross-scan: {}", config.fallback_to_cross_scan);
    }

    let reconstructor = Reconstructor::new(config);
    let mut failures = 0usize;

    for input in inputs {
        info!("Loading normal map from {:?}...", input);
        let normals = match load_normal_map(input) {
            Ok(n) => n,
            Err(e) => {
                warn!("  Skipping {:?}: {}", input, e);
                failures += 1;
                continue;
            }
        };
        info!("  {}x{} texels", normals.width(), normals.height());

        let heights = match reconstructor.reconstruct(&normals) {
            Ok(h) => h,
            Err(e) => {
                warn!("  Reconstruction failed for {:?}: {}", input, e);
                failures += 1;
                continue;
            }
        };

        let output = output_path(input, output_dir);
        save_height_map(&heights, &output)?;
        info!("Exported height map to {:?}", output);
    }

    if failures > 0 {
        return Err(format!("{} of {} inputs failed", failures, inputs.len()).into());
    }
    Ok(())
}

fn preview(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading normal map from {:?}...", input);
    let normals = load_normal_map(input)?;
    let slopes = slope_field(&normals);

    let steep = slopes.iter().filter(|s| s.max_abs() > 1.0).count();
    if steep > 0 {
        warn!(
            "  {} of {} texels are steeper than 45 degrees; the preview will not match exactly",
            steep,
            slopes.len()
        );
    }

    let image = encode_normal_map(&normal_field(&slopes))?;
    image.save(output)?;
    info!("Exported preview to {:?}", output);
    Ok(())
}

fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "texture".to_string());
    output_dir.join(format!("{}_height.png", stem))
}
