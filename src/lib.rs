pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod formats;
pub mod keys;
pub mod logger;
pub mod processing;
pub mod report;
pub mod store;
pub mod upload;

pub use batch::{plan_batches, process_asset, run_in_batches, run_pipeline};
pub use config::Config;
pub use discovery::{discover_assets, ImageAsset};
pub use error::{PublishError, Result};
pub use formats::{content_type_for, ImageKind};
pub use keys::{remote_key, Variant};
pub use processing::{
    decode_image, encode_webp, optimize_image, transform_asset, TransformResult,
    TransformSettings,
};
pub use report::{print_summary, reduction_percent, RunStats};
pub use store::{ObjectStore, S3Settings, S3Store, StoreError};
pub use upload::{check_existing, upload_artifact, UncertainPolicy};
