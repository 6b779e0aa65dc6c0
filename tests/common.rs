#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_publish::processing::TransformSettings;
use img_publish::store::{ObjectStore, S3Settings, StoreError};
use img_publish::Config;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// In-memory bucket that records every call and can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, StoredObject>>,
    pub head_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    /// PUTs for keys containing this fragment fail.
    pub fail_puts_matching: Option<String>,
    /// Every HEAD fails.
    pub fail_heads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_puts(fragment: &str) -> Self {
        Self {
            fail_puts_matching: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_heads() -> Self {
        Self {
            fail_heads: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_exists(&self, key: &str) -> Result<bool, StoreError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_heads {
            return Err(StoreError::new("HEAD", key, "503 slow down"));
        }
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fragment) = &self.fail_puts_matching {
            if key.contains(fragment.as_str()) {
                return Err(StoreError::new("PUT", key, "403 access denied"));
            }
        }
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                cache_control: cache_control.to_string(),
            },
        );
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("memory://bucket/{}", key)
    }
}

pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x * y) % 256) as u8])
    }))
}

/// Writes a real image at `root/relative`, format picked from the extension.
pub fn write_image(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let format = ImageFormat::from_path(&path).unwrap();
    gradient(48, 32).save_with_format(&path, format).unwrap();
    path
}

pub fn write_garbage(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"this is not an image at all").unwrap();
    path
}

/// Source tree with `count` images spread over a few subdirectories.
pub fn create_image_tree(root: &Path, count: usize) -> Vec<PathBuf> {
    let extensions = ["jpg", "png", "gif", "JPEG"];
    (0..count)
        .map(|i| {
            let relative = format!("dir{}/image{}.{}", i % 3, i, extensions[i % extensions.len()]);
            write_image(root, &relative)
        })
        .collect()
}

pub fn test_config(source: &Path, output: &Path) -> Config {
    Config {
        source_dir: source.to_path_buf(),
        output_dir: output.to_path_buf(),
        store: S3Settings {
            bucket: "site-assets".to_string(),
            region: "eu-west-2".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            endpoint_url: None,
        },
        key_prefix: String::new(),
        transform: TransformSettings {
            quality: 85,
            webp_quality: 80,
        },
        batch_size: 5,
        skip_existing: false,
        skip_on_uncertain: false,
        dry_run: false,
        fail_on_error: false,
    }
}

/// Counts regular files below `dir`, recursively.
pub fn count_files(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
