pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_WEBP_QUALITY: u8 = 80;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_SOURCE_DIR: &str = "img";
pub const DEFAULT_OUTPUT_DIR: &str = ".img-publish";

/// Directory (and key segment) for the re-encoded original-format artifacts.
pub const OPTIMIZED_DIR: &str = "optimized";
/// Directory (and key segment) for the WebP artifacts.
pub const WEBP_DIR: &str = "webp";

pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Extensions picked up by discovery. WebP is an output format only.
pub const SOURCE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
/// libwebp refuses anything wider or taller than this.
pub const MAX_IMAGE_DIMENSION: u32 = 16_383;

pub const LIBDEFLATER_LEVEL: u8 = 12;
pub const OXIPNG_PRESET: u8 = 4;

/// Smallest palette a lossy PNG is quantized to.
pub const MIN_PNG_PALETTE_COLORS: usize = 16;
pub const MAX_PNG_PALETTE_COLORS: usize = 256;
/// NeuQuant learns from every `n`th pixel.
pub const NEUQUANT_SAMPLE_FACTOR: i32 = 10;
/// Below this many pixels quantization is not worth it.
pub const MIN_QUANTIZE_PIXELS: usize = 1024;

pub const GIF_FASTEST_SPEED: i32 = 30;

pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 256;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
