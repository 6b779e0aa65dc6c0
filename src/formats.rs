//! Image format handling for discovered assets and their derived artifacts.
//!
//! Formats are resolved from file extensions only; the content itself is
//! sniffed later by the decoder.

use crate::constants::{FALLBACK_CONTENT_TYPE, SOURCE_IMAGE_EXTENSIONS};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::WebP),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Jpeg => "JPEG",
            ImageKind::Png => "PNG",
            ImageKind::Gif => "GIF",
            ImageKind::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

/// Returns true when discovery should pick up the file.
pub fn is_source_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SOURCE_IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Content type for an upload, derived from the extension of a path or key.
pub fn content_type_for(path_or_key: &str) -> &'static str {
    ImageKind::from_path(Path::new(path_or_key))
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_kind_from_extension() {
        assert_eq!(ImageKind::from_extension("jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("JPEG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("Png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("gif"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::from_extension("webp"), Some(ImageKind::WebP));
        assert_eq!(ImageKind::from_extension("bmp"), None);
    }

    #[test]
    fn test_is_source_image() {
        assert!(is_source_image(Path::new("photo.jpg")));
        assert!(is_source_image(Path::new("a/b/photo.JPG")));
        assert!(is_source_image(Path::new("logo.jpeg")));
        assert!(is_source_image(Path::new("logo.png")));
        assert!(is_source_image(Path::new("spinner.gif")));

        assert!(!is_source_image(Path::new("already.webp")));
        assert!(!is_source_image(Path::new("notes.txt")));
        assert!(!is_source_image(Path::new("jpg")));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("optimized/a/photo.jpg"), "image/jpeg");
        assert_eq!(content_type_for("optimized/a/photo.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("optimized/logo.png"), "image/png");
        assert_eq!(content_type_for("optimized/spin.gif"), "image/gif");
        assert_eq!(content_type_for("webp/a/photo.webp"), "image/webp");
        assert_eq!(content_type_for("styles/site.css"), "application/octet-stream");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_image_kind_display() {
        assert_eq!(format!("{}", ImageKind::Jpeg), "JPEG");
        assert_eq!(format!("{}", ImageKind::WebP), "WebP");
    }
}
