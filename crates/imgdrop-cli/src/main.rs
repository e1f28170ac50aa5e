//! imgdrop CLI: validate and upload local images to the configured host.
//!
//! Set IMGDROP_CLOUD_NAME and IMGDROP_UPLOAD_PRESET (optionally IMGDROP_API_BASE).
//! Intake limits come from the other IMGDROP_* variables.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use imgdrop_cli::{init_tracing, load_files, UploadReport, ValidationReport};
use imgdrop_client::UploadClient;
use imgdrop_core::{FileValidator, FnHooks, PreviewMode, UploaderConfig};
use imgdrop_uploader::ImageUploader;

#[derive(Parser)]
#[command(name = "imgdrop", about = "Validate and upload images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload images and print the final state of each one
    Upload {
        /// Image files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Extra rounds of retrying failed uploads after the first pass
        #[arg(long, default_value = "0")]
        retry_rounds: u32,
        /// Preview representation: data-url or object
        #[arg(long)]
        preview_mode: Option<PreviewMode>,
    },
    /// Check files against the intake rules without uploading
    Validate {
        /// Image files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

async fn upload(
    config: UploaderConfig,
    files: Vec<PathBuf>,
    retry_rounds: u32,
) -> anyhow::Result<UploadReport> {
    let client = UploadClient::from_env().context(
        "Failed to create upload client. Set IMGDROP_CLOUD_NAME and IMGDROP_UPLOAD_PRESET",
    )?;

    let hooks = FnHooks::new()
        .on_complete(|images| {
            tracing::info!(images = images.len(), "Upload pass complete");
        })
        .on_error(|error| {
            tracing::warn!(error_code = error.error_code(), error = %error, "Upload error");
        });

    let uploader = ImageUploader::new(config, Arc::new(client), Arc::new(hooks))?;
    let sources = load_files(&files).await?;
    uploader.intake(sources).await?;
    uploader.trigger_upload().await?;

    for round in 1..=retry_rounds {
        if uploader.summary().failed == 0 {
            break;
        }
        tracing::info!(round = round, "Retrying failed uploads");
        if uploader.retry_all_failed().await?.is_none() {
            break;
        }
    }

    let report = UploadReport::new(&uploader.images(), uploader.overall_progress());
    uploader.shutdown();
    Ok(report)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = UploaderConfig::from_env().context("Invalid IMGDROP_* configuration")?;

    match cli.command {
        Commands::Upload {
            files,
            retry_rounds,
            preview_mode,
        } => {
            if let Some(mode) = preview_mode {
                config.preview_mode = mode;
            }
            let report = upload(config, files, retry_rounds).await?;
            print_json(&report)?;
            if report.failed > 0 {
                anyhow::bail!("{} of {} upload(s) failed", report.failed, report.total);
            }
        }
        Commands::Validate { files } => {
            let validator = FileValidator::from_config(&config);
            let sources = load_files(&files).await?;
            let report = ValidationReport::new(&validator, &sources);
            print_json(&report)?;
            if !report.valid {
                anyhow::bail!("Validation failed");
            }
        }
    }

    Ok(())
}
