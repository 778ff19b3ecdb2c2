use clap::{Parser, Subcommand};
use image_compressor_core::{
    logging, CompressionOptions, CompressionOutcome, Config, ImageCompressor, LogLevel,
};
use log::{debug, info};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "image-compressor")]
#[command(about = "Collect images into a managed store and batch-compress them")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to a rotating file in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy image files into the store and record them
    Add {
        /// Files or directories to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Maximum directory depth when a directory is given
        #[arg(long, default_value_t = 1)]
        max_depth: usize,
    },

    /// List recorded images, newest first
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encode every recorded image
    Compress {
        /// Compression quality (1-95)
        #[arg(short, long)]
        quality: Option<u8>,

        /// Bit depth (1, 8 or 16)
        #[arg(short, long)]
        bit_depth: Option<u8>,

        /// Output format (JPEG, PNG, WEBP, BMP)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Delete a record
    Remove {
        /// Record id
        id: i64,

        /// Also delete the stored file
        #[arg(long)]
        delete_file: bool,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "image-compressor.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Set up configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => Config::default(),
    };

    // Set log level based on verbosity
    config.log_level = match cli.verbose {
        0 => config.log_level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    init_logging(&cli, config.log_level)?;

    match cli.command {
        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }

        Commands::Add { paths, max_depth } => {
            let compressor = ImageCompressor::new(config)?;
            let candidates = expand_candidates(&paths, max_depth);
            debug!("Expanded {} argument(s) to {} file(s)", paths.len(), candidates.len());

            let result = compressor.ingest(&candidates)?;
            if result.nothing_supported() {
                println!("No supported image files given.");
                return Ok(());
            }

            for rejection in &result.rejected {
                println!(
                    "Could not add {}: {}",
                    rejection.path.display(),
                    rejection.reason
                );
            }
            println!("Successfully added {} image(s).", result.accepted);
            Ok(())
        }

        Commands::List { json } => {
            let compressor = ImageCompressor::new(config)?;
            let records = compressor.list_images()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            println!("{:>6}  {:<32}  File path", "ID", "Filename");
            for record in &records {
                println!(
                    "{:>6}  {:<32}  {}",
                    record.id,
                    record.display_name,
                    record.storage_path.display()
                );
            }
            Ok(())
        }

        Commands::Compress {
            quality,
            bit_depth,
            format,
        } => {
            // Validate options before touching any file
            let options = CompressionOptions::from_raw(
                quality.unwrap_or(config.default_quality),
                bit_depth.unwrap_or(config.default_bit_depth),
                format.as_deref().unwrap_or(&config.default_format),
            )?;

            let compressor = ImageCompressor::new(config)?;

            info!("Starting compression...");
            match compressor.compress_all(&options)? {
                CompressionOutcome::NothingToCompress => {
                    println!("No images in the database to compress.");
                }
                CompressionOutcome::Completed(result) => {
                    for failure in &result.failures {
                        println!(
                            "Failed to compress {} (id {}): {}",
                            failure.display_name, failure.id, failure.reason
                        );
                    }
                    println!(
                        "Completed compressing {} image(s), {} failed.",
                        result.attempted,
                        result.failures.len()
                    );
                }
            }
            Ok(())
        }

        Commands::Remove { id, delete_file } => {
            let compressor = ImageCompressor::new(config)?;
            let record = compressor.remove_image(id, delete_file)?;
            println!("Removed {} ({})", record.display_name, record.id);
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, level: LogLevel) -> Result<(), anyhow::Error> {
    match &cli.log_dir {
        Some(dir) => logging::init_logger(dir, level.into())
            .map_err(|e| anyhow::anyhow!("Failed to initialize file logging: {}", e)),
        None => {
            env_logger::Builder::new()
                .filter_level(level.into())
                .parse_default_env()
                .init();
            Ok(())
        }
    }
}

/// Turn the given paths into a flat list of files, walking directories
fn expand_candidates(paths: &[PathBuf], max_depth: usize) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for path in paths {
        if path.is_dir() {
            candidates.extend(files_in_directory(path, max_depth));
        } else {
            candidates.push(path.clone());
        }
    }
    candidates
}

fn files_in_directory(directory: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
