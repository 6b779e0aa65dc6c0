//! Deterministic naming of derived artifacts, both remote keys and local paths.

use crate::constants::{OPTIMIZED_DIR, WEBP_DIR};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Optimized,
    WebP,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Optimized, Variant::WebP];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Variant::Optimized => OPTIMIZED_DIR,
            Variant::WebP => WEBP_DIR,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Optimized => write!(f, "optimized"),
            Variant::WebP => write!(f, "webp"),
        }
    }
}

/// Relative location of an artifact, e.g. `webp/a/b/photo.webp`.
///
/// `relative_path` uses forward slashes. The WebP variant replaces the last
/// extension with a lower-case `.webp` and keeps the base name untouched.
pub fn variant_relative_path(relative_path: &str, variant: Variant) -> String {
    let relative_path = relative_path.trim_start_matches('/');
    match variant {
        Variant::Optimized => format!("{}/{}", variant.dir_name(), relative_path),
        Variant::WebP => format!("{}/{}.webp", variant.dir_name(), strip_extension(relative_path)),
    }
}

/// Remote key of an artifact, with the configured prefix applied.
pub fn remote_key(prefix: &str, relative_path: &str, variant: Variant) -> String {
    format!("{}{}", prefix, variant_relative_path(relative_path, variant))
}

/// Local output path of an artifact under `output_dir`.
pub fn local_artifact_path(output_dir: &Path, relative_path: &str, variant: Variant) -> PathBuf {
    variant_relative_path(relative_path, variant)
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(output_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Normalizes a user supplied key prefix to either `""` or `"some/prefix/"`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

/// Converts a host path relative to the source root into a forward-slash key path.
pub fn to_key_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_extension(relative_path: &str) -> &str {
    let file_start = relative_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match relative_path[file_start..].rfind('.') {
        // A leading dot is part of the name, not an extension
        Some(0) | None => relative_path,
        Some(dot) => &relative_path[..file_start + dot],
    }
}
