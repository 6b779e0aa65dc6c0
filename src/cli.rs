use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_QUALITY, DEFAULT_SOURCE_DIR,
    DEFAULT_WEBP_QUALITY,
};
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "img-publish",
    about = "Optimize site images, convert them to WebP and upload both to S3",
    long_about = "img-publish walks a directory of JPEG, PNG and GIF images, re-encodes each one \
                  in its own format, produces a WebP copy, and uploads both variants to an \
                  S3-compatible bucket with a one-year immutable cache policy. \
                  Every option can also be set through the environment variable shown next to it.",
    version,
    after_help = "EXAMPLES:\n  \
    AWS_BUCKET=site-assets AWS_REGION=eu-west-2 img-publish ./img\n  \
    img-publish ./img --prefix images --skip-existing\n  \
    img-publish ./img --dry-run -q 80 --webp-quality 75 -b 10"
)]
pub struct Args {
    #[arg(
        env = "IMG_SOURCE_DIR",
        default_value = DEFAULT_SOURCE_DIR,
        help = "Directory to scan for images (recursively)"
    )]
    pub source: PathBuf,

    #[arg(
        short = 'o',
        long,
        env = "IMG_OUTPUT_DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Directory for the optimized/ and webp/ output trees"
    )]
    pub output_dir: PathBuf,

    #[arg(long, env = "AWS_BUCKET", help = "Destination bucket")]
    pub bucket: Option<String>,

    #[arg(long, env = "AWS_REGION", help = "Bucket region")]
    pub region: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, help = "Access key id")]
    pub access_key_id: Option<String>,

    #[arg(
        long,
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        help = "Secret access key"
    )]
    pub secret_access_key: Option<String>,

    #[arg(
        long,
        env = "AWS_ENDPOINT_URL",
        help = "Custom S3-compatible endpoint (path-style addressing)"
    )]
    pub endpoint_url: Option<String>,

    #[arg(
        long,
        env = "IMG_KEY_PREFIX",
        default_value = "",
        help = "Prefix prepended to every uploaded key"
    )]
    pub prefix: String,

    #[arg(
        short = 'q',
        long,
        env = "IMG_QUALITY",
        default_value_t = DEFAULT_QUALITY,
        help = "Quality of the optimized original-format variant (1-100)"
    )]
    pub quality: u8,

    #[arg(
        long,
        env = "IMG_WEBP_QUALITY",
        default_value_t = DEFAULT_WEBP_QUALITY,
        help = "Quality of the WebP variant (1-100)"
    )]
    pub webp_quality: u8,

    #[arg(
        short = 'b',
        long,
        env = "IMG_BATCH_SIZE",
        default_value_t = DEFAULT_BATCH_SIZE,
        help = "Number of images processed concurrently per batch"
    )]
    pub batch_size: usize,

    #[arg(
        long,
        env = "IMG_SKIP_EXISTING",
        value_parser = FalseyValueParser::new(),
        help = "Skip variants whose key already exists in the bucket"
    )]
    pub skip_existing: bool,

    #[arg(
        long,
        env = "IMG_SKIP_ON_UNCERTAIN",
        value_parser = FalseyValueParser::new(),
        help = "Treat a failed existence check as 'exists' instead of re-uploading"
    )]
    pub skip_on_uncertain: bool,

    #[arg(
        long,
        env = "IMG_DRY_RUN",
        value_parser = FalseyValueParser::new(),
        help = "Transform locally but only log the uploads"
    )]
    pub dry_run: bool,

    #[arg(
        long,
        env = "IMG_FAIL_ON_ERROR",
        value_parser = FalseyValueParser::new(),
        help = "Exit non-zero when any image failed"
    )]
    pub fail_on_error: bool,

    #[arg(short, long, help = "Log every key and upload")]
    pub verbose: bool,

    #[arg(long, conflicts_with = "verbose", help = "Only print errors and the summary")]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["img-publish", "site/img"]).unwrap();
        assert_eq!(args.source, PathBuf::from("site/img"));
        assert_eq!(args.quality, DEFAULT_QUALITY);
        assert_eq!(args.webp_quality, DEFAULT_WEBP_QUALITY);
        assert_eq!(args.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(args.prefix, "");
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "img-publish",
            "img",
            "--bucket",
            "assets",
            "--dry-run",
            "--skip-existing",
            "-q",
            "70",
            "-b",
            "3",
        ])
        .unwrap();
        assert_eq!(args.bucket.as_deref(), Some("assets"));
        assert!(args.dry_run);
        assert!(args.skip_existing);
        assert!(!args.fail_on_error);
        assert_eq!(args.quality, 70);
        assert_eq!(args.batch_size, 3);
    }
}
