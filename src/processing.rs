use crate::constants::{
    GIF_FASTEST_SPEED, LIBDEFLATER_LEVEL, MAX_FILE_SIZE, MAX_IMAGE_DIMENSION,
    MAX_PNG_PALETTE_COLORS, MAX_QUALITY, MIN_PNG_PALETTE_COLORS, MIN_QUANTIZE_PIXELS,
    NEUQUANT_SAMPLE_FACTOR, OXIPNG_PRESET,
};
use crate::discovery::ImageAsset;
use crate::error::{PublishError, Result};
use crate::formats::ImageKind;
use crate::keys::{local_artifact_path, Variant};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use color_quant::NeuQuant;
use image::{DynamicImage, Frame, GenericImageView, ImageReader, RgbaImage};
use oxipng::{Deflaters, Options, StripChunks};
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Quality knobs for the two derived variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSettings {
    pub quality: u8,
    pub webp_quality: u8,
}

/// The two artifacts written for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub optimized_path: PathBuf,
    pub optimized_size: u64,
    pub webp_path: PathBuf,
    pub webp_size: u64,
}

/// Reads `asset`, writes its optimized and WebP artifacts under `output_dir`.
///
/// The source file is only read. Both artifacts are encoded before either is
/// written, so a decode or encode failure leaves no partial output behind.
pub fn transform_asset(
    asset: &ImageAsset,
    output_dir: &Path,
    settings: TransformSettings,
) -> Result<TransformResult> {
    let file_size = fs::metadata(&asset.source_path)?.len();
    if file_size > MAX_FILE_SIZE {
        return Err(PublishError::FileTooLarge(file_size, MAX_FILE_SIZE));
    }

    let bytes = fs::read(&asset.source_path)?;
    let img = decode_image(&bytes)?;

    let optimized = optimize_image(&img, asset.kind, settings.quality)?;
    let webp = encode_webp(&img, settings.webp_quality)?;

    let optimized_path = local_artifact_path(output_dir, &asset.relative_path, Variant::Optimized);
    let webp_path = local_artifact_path(output_dir, &asset.relative_path, Variant::WebP);
    write_artifact(&optimized_path, &optimized)?;
    write_artifact(&webp_path, &webp)?;

    Ok(TransformResult {
        optimized_path,
        optimized_size: optimized.len() as u64,
        webp_path,
        webp_size: webp.len() as u64,
    })
}

/// Decodes an image, sniffing the format from its content.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(PublishError::InvalidDimensions(
            width,
            height,
            MAX_IMAGE_DIMENSION,
        ));
    }

    Ok(img)
}

/// Re-encodes `img` in its own format at the given quality.
pub fn optimize_image(img: &DynamicImage, kind: ImageKind, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
        }
        ImageKind::Png => {
            match quantize_palette(img, quality) {
                Some(quantized) => DynamicImage::ImageRgba8(quantized)
                    .write_with_encoder(PngEncoder::new(&mut buf))?,
                None => img.write_with_encoder(PngEncoder::new(&mut buf))?,
            }
            // oxipng turns the reduced colour set into an indexed PNG
            buf = oxipng::optimize_from_memory(&buf, &png_options())
                .map_err(|e| PublishError::PngOptimization(e.to_string()))?;
        }
        ImageKind::Gif => {
            let mut encoder = GifEncoder::new_with_speed(&mut buf, gif_speed(quality));
            encoder.encode_frame(Frame::new(img.to_rgba8()))?;
        }
        ImageKind::WebP => {
            buf = encode_webp(img, quality)?;
        }
    }

    Ok(buf)
}

/// Lossy WebP encoding at the given quality.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(PublishError::WebpEncoding(format!(
            "{}x{} exceeds the {}px WebP limit",
            width, height, MAX_IMAGE_DIMENSION
        )));
    }

    // The encoder only accepts 8-bit RGB(A) buffers
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let encoder = webp::Encoder::from_image(&rgba)
        .map_err(|e| PublishError::WebpEncoding(e.to_string()))?;
    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| PublishError::WebpEncoding(format!("{:?}", e)))?;
    Ok(memory.to_vec())
}

/// Palette size for a lossy PNG: 100 keeps every colour, lower qualities
/// shrink the palette down to [`MIN_PNG_PALETTE_COLORS`].
pub fn png_palette_size(quality: u8) -> Option<usize> {
    if quality >= MAX_QUALITY {
        return None;
    }
    let colors = usize::from(quality) * MAX_PNG_PALETTE_COLORS / usize::from(MAX_QUALITY);
    Some(colors.clamp(MIN_PNG_PALETTE_COLORS, MAX_PNG_PALETTE_COLORS))
}

/// Maps every pixel onto a NeuQuant palette sized by `quality`.
///
/// Returns `None` when the image should stay untouched: quality 100, tiny
/// images, or images that already fit the palette.
fn quantize_palette(img: &DynamicImage, quality: u8) -> Option<RgbaImage> {
    let colors = png_palette_size(quality)?;
    let mut rgba = img.to_rgba8();

    let pixel_count = rgba.width() as usize * rgba.height() as usize;
    if pixel_count < MIN_QUANTIZE_PIXELS || fits_palette(&rgba, colors) {
        return None;
    }

    let quantizer = NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, colors, rgba.as_raw());
    for pixel in rgba.pixels_mut() {
        if let Some(color) = quantizer.lookup(quantizer.index_of(&pixel.0)) {
            pixel.0 = color;
        }
    }
    Some(rgba)
}

fn fits_palette(rgba: &RgbaImage, colors: usize) -> bool {
    let mut seen = HashSet::new();
    rgba.pixels().all(|pixel| {
        seen.insert(pixel.0);
        seen.len() <= colors
    })
}

fn png_options() -> Options {
    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.strip = StripChunks::Safe;
    options.deflate = Deflaters::Libdeflater {
        compression: LIBDEFLATER_LEVEL,
    };
    options
}

/// Maps quality 1..=100 onto the GIF quantizer speed 30..=1.
fn gif_speed(quality: u8) -> i32 {
    let quality = i32::from(quality.clamp(1, 100));
    (GIF_FASTEST_SPEED - (quality - 1) * (GIF_FASTEST_SPEED - 1) / 99).clamp(1, GIF_FASTEST_SPEED)
}

fn write_artifact(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;
    Ok(())
}
