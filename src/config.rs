use crate::cli::Args;
use crate::constants::{MAX_QUALITY, MIN_QUALITY};
use crate::error::{PublishError, Result};
use crate::keys::normalize_prefix;
use crate::processing::TransformSettings;
use crate::store::S3Settings;
use std::path::PathBuf;

/// Everything a run needs, built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub store: S3Settings,
    /// Either empty or ending in `/`.
    pub key_prefix: String,
    pub transform: TransformSettings,
    pub batch_size: usize,
    pub skip_existing: bool,
    pub skip_on_uncertain: bool,
    pub dry_run: bool,
    pub fail_on_error: bool,
}

impl Config {
    /// Validates CLI/environment input. Missing credentials are reported here,
    /// before any image is touched.
    pub fn from_args(args: &Args) -> Result<Self> {
        let store = S3Settings {
            bucket: required(&args.bucket, "AWS_BUCKET", "--bucket")?,
            region: required(&args.region, "AWS_REGION", "--region")?,
            access_key_id: required(&args.access_key_id, "AWS_ACCESS_KEY_ID", "--access-key-id")?,
            secret_access_key: required(
                &args.secret_access_key,
                "AWS_SECRET_ACCESS_KEY",
                "--secret-access-key",
            )?,
            endpoint_url: args
                .endpoint_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        };

        let transform = TransformSettings {
            quality: validate_quality("quality", args.quality)?,
            webp_quality: validate_quality("webp quality", args.webp_quality)?,
        };

        if args.batch_size == 0 {
            return Err(PublishError::InvalidBatchSize(args.batch_size));
        }

        Ok(Self {
            source_dir: args.source.clone(),
            output_dir: args.output_dir.clone(),
            store,
            key_prefix: normalize_prefix(&args.prefix),
            transform,
            batch_size: args.batch_size,
            skip_existing: args.skip_existing,
            skip_on_uncertain: args.skip_on_uncertain,
            dry_run: args.dry_run,
            fail_on_error: args.fail_on_error,
        })
    }
}

fn required(value: &Option<String>, env: &'static str, flag: &'static str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(PublishError::MissingConfig { env, flag })
}

fn validate_quality(name: &'static str, value: u8) -> Result<u8> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&value) {
        return Err(PublishError::InvalidQuality { name, value });
    }
    Ok(value)
}
