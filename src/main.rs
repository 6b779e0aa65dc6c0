use anyhow::{Context, Result};
use clap::Parser;
use img_publish::cli::Args;
use img_publish::{logger, print_summary, run_pipeline, Config, S3Store};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    logger::init(args.verbose, args.quiet);

    let config = Config::from_args(&args).context("Invalid configuration")?;

    info!("🖼️  Image optimization and upload");
    info!("📁 Source: {:?}", config.source_dir);
    info!("📁 Output: {:?}", config.output_dir);
    info!(
        "🪣 Bucket: {} ({}), prefix: {:?}",
        config.store.bucket, config.store.region, config.key_prefix
    );
    if config.dry_run {
        info!("🧪 DRY RUN: nothing will be uploaded");
    }

    let store = S3Store::new(&config.store);
    let stats = run_pipeline(&config, &store)
        .await
        .context("Image publishing aborted")?;

    print_summary(&stats, config.dry_run);

    if config.fail_on_error && stats.errors > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
