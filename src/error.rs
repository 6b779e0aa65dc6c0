use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("WebP encoding error: {0}")]
    WebpEncoding(String),

    #[error("Invalid {name} value: {value}. Must be between 1 and 100")]
    InvalidQuality { name: &'static str, value: u8 },

    #[error("Invalid batch size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid image dimensions: {0}x{1}. Maximum allowed: {2}x{2}")]
    InvalidDimensions(u32, u32, u32),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Missing required configuration: set {env} or pass {flag}")]
    MissingConfig {
        env: &'static str,
        flag: &'static str,
    },

    #[error("Cannot read source directory {path:?}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    #[error("Cannot create output directory {path:?}: {reason}")]
    OutputDirectory { path: PathBuf, reason: String },

    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PublishError>;
