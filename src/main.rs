use clap::{Parser, Subcommand};
use mediadrop::imaging::RustBackend;
use mediadrop::media::MediaFile;
use mediadrop::select::{SelectOptions, VariantSelector};
use mediadrop::upload::{FileType, PresignedUploader};
use mediadrop::{checksum, config, output, policy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediadrop")]
#[command(about = "Normalize media files and upload them through presigned URLs")]
#[command(long_about = "\
Normalize media files and upload them through presigned URLs

Images are shrunk to fit the configured bounding box and, when large enough,
re-encoded as AVIF and WebP; the smallest candidate wins. Every upload is
validated locally, presigned by the API, PUT directly to object storage and
then confirmed.

Credentials come from the environment (a .env file is honored):
  MEDIADROP_TOKEN     Bearer token (preferred)
  MEDIADROP_API_KEY   X-API-Key header
  MEDIADROP_API_URL   Overrides api.base_url

Logging is controlled with RUST_LOG (default: info).

Run 'mediadrop gen-config' to generate a documented mediadrop.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./mediadrop.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a file against the upload policy and print its checksum
    Check {
        file: PathBuf,
    },
    /// Write the smallest acceptable variant of an image
    Optimize {
        file: PathBuf,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Bounding box override (pixels)
        #[arg(long)]
        max_dim: Option<u32>,
    },
    /// Optimize (unless disabled) and upload a file
    Upload {
        file: PathBuf,
        /// Category the backend files the upload under
        #[arg(long, default_value = "PROFILE")]
        file_type: FileType,
        /// Upload the file exactly as read from disk
        #[arg(long)]
        no_optimize: bool,
        /// Print the receipt as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock mediadrop.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check { file } => {
            let media = MediaFile::read(&file).await?;
            let validation = policy::validate(&media);
            let digest = checksum::digest(&media).await;
            output::print_check(&media, &validation, digest.as_deref());
            validation?;
        }
        Command::Optimize { file, out, max_dim } => {
            let config = config::load_config(cli.config.as_deref())?;
            let selector =
                VariantSelector::from_config(Arc::new(RustBackend::new()), &config.images);
            let mut options = SelectOptions::from(&config.images);
            if let Some(max_dim) = max_dim {
                options.max_dim = max_dim;
            }

            let media = MediaFile::read(&file).await?;
            let selection = selector.select_candidates(media.clone(), options).await?;
            output::print_selection(&media, &selection);

            let winner = selection.into_file();
            tokio::fs::create_dir_all(&out).await?;
            let target = out.join(winner.name());
            tokio::fs::write(&target, winner.bytes()).await?;
            info!(path = %target.display(), "written");
        }
        Command::Upload {
            file,
            file_type,
            no_optimize,
            json,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let mut media = MediaFile::read(&file).await?;
            if !no_optimize {
                let selector =
                    VariantSelector::from_config(Arc::new(RustBackend::new()), &config.images);
                media = selector
                    .select_smallest(media, SelectOptions::from(&config.images))
                    .await?;
            }

            let uploader = PresignedUploader::from_config(&config)?;
            let pending = uploader.begin(media.clone(), file_type);
            let pending = if json {
                pending
            } else {
                pending.with_progress(output::print_progress)
            };

            let handle = pending.handle();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, aborting upload");
                    handle.abort();
                }
            });
            let result = pending.run().await;
            interrupt.abort();

            let receipt = result?;
            if json {
                println!("{}", serde_json::to_string_pretty(&receipt)?);
            } else {
                output::print_receipt(&media, &receipt);
            }
        }
    }

    Ok(())
}
