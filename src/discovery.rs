use crate::error::{PublishError, Result};
use crate::formats::{is_source_image, ImageKind};
use crate::keys::to_key_path;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One source image found under the configured root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Path relative to the source root, always with `/` separators.
    pub relative_path: String,
    pub source_path: PathBuf,
    pub size: u64,
    pub kind: ImageKind,
}

/// Recursively collects the images under `root`, sorted by relative path.
///
/// Entries that cannot be read (permission errors, symlink loops) are skipped
/// with a warning. Hidden entries and anything under `exclude` are ignored.
/// Only an unreadable root is fatal.
pub fn discover_assets(root: &Path, exclude: Option<&Path>) -> Result<Vec<ImageAsset>> {
    let canonical_root = root.canonicalize().map_err(|e| PublishError::Discovery {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !canonical_root.is_dir() {
        return Err(PublishError::Discovery {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    // Fails early on an unreadable root instead of producing an empty walk
    fs::read_dir(&canonical_root).map_err(|e| PublishError::Discovery {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let exclude = exclude.and_then(|path| path.canonicalize().ok());

    let walker = WalkDir::new(&canonical_root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            if entry.file_name().to_string_lossy().starts_with('.') {
                return false;
            }
            match &exclude {
                Some(excluded) => !entry.path().starts_with(excluded),
                None => true,
            }
        });

    let mut assets = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_source_image(path) {
            continue;
        }

        let Some(kind) = ImageKind::from_path(path) else {
            continue;
        };

        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let Ok(relative) = path.strip_prefix(&canonical_root) else {
            continue;
        };

        let asset = ImageAsset {
            relative_path: to_key_path(relative),
            source_path: path.to_path_buf(),
            size,
            kind,
        };
        debug!("Discovered {} ({} bytes)", asset.relative_path, asset.size);
        assets.push(asset);
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap().write_all(data).unwrap();
    }

    #[test]
    fn test_discover_assets_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.png"), b"png");
        touch(&root.join("a/b/photo.JPG"), b"jpeg data");
        touch(&root.join("a/spinner.gif"), b"gif");
        touch(&root.join("a/notes.txt"), b"text");
        touch(&root.join("c/already.webp"), b"webp");

        let assets = discover_assets(root, None).unwrap();
        let paths: Vec<_> = assets.iter().map(|a| a.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a/b/photo.JPG", "a/spinner.gif", "b.png"]);

        assert_eq!(assets[0].kind, ImageKind::Jpeg);
        assert_eq!(assets[0].size, 9);
        assert!(assets[0].source_path.is_absolute());
    }

    #[test]
    fn test_discover_assets_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let assets = discover_assets(temp_dir.path(), None).unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_discover_assets_skips_hidden_and_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("keep.jpg"), b"x");
        touch(&root.join(".cache/hidden.jpg"), b"x");
        touch(&root.join("out/optimized/keep.jpg"), b"x");

        let assets = discover_assets(root, Some(&root.join("out"))).unwrap();
        let paths: Vec<_> = assets.iter().map(|a| a.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["keep.jpg"]);
    }

    #[test]
    fn test_discover_assets_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let result = discover_assets(&temp_dir.path().join("missing"), None);
        assert!(matches!(result, Err(PublishError::Discovery { .. })));
    }

    #[test]
    fn test_discover_assets_file_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("photo.jpg");
        touch(&file, b"x");
        let result = discover_assets(&file, None);
        assert!(matches!(result, Err(PublishError::Discovery { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_assets_skips_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("top.gif"), b"x");
        touch(&root.join("open/photo.jpg"), b"x");
        touch(&root.join("locked/secret.png"), b"x");

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not bind a privileged user
        let enforced = fs::read_dir(&locked).is_err();
        let result = discover_assets(root, None);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let assets = result.unwrap();
        let paths: Vec<_> = assets.iter().map(|a| a.relative_path.as_str()).collect();
        assert!(paths.contains(&"open/photo.jpg"));
        assert!(paths.contains(&"top.gif"));
        if enforced {
            assert_eq!(paths, vec!["open/photo.jpg", "top.gif"]);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_assets_survives_symlink_loop() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("dir/photo.png"), b"x");
        std::os::unix::fs::symlink(root.join("dir"), root.join("dir/loop")).unwrap();

        let assets = discover_assets(root, None).unwrap();
        let paths: Vec<_> = assets.iter().map(|a| a.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["dir/photo.png"]);
    }
}
