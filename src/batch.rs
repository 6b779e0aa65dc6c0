use crate::config::Config;
use crate::constants::{MIN_AVAILABLE_MEMORY_MIB, PROGRESS_BAR_TEMPLATE};
use crate::discovery::{discover_assets, ImageAsset};
use crate::error::{PublishError, Result};
use crate::formats::ImageKind;
use crate::keys::{remote_key, variant_relative_path, Variant};
use crate::processing::transform_asset;
use crate::report::{AssetOutcome, AssetStatus, RunStats};
use crate::store::ObjectStore;
use crate::upload::{check_existing, upload_artifact, UncertainPolicy};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::future::Future;
use std::hash::Hash;
use std::time::Instant;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::{error, info, warn};

/// Splits `items` into batches of at most `batch_size`, keeping their order.
///
/// Two items with the same `key` never share a batch: the later one is moved
/// to the next batch that has no item with that key yet.
pub fn plan_batches<T, K, F>(items: &[T], batch_size: usize, key: F) -> Vec<Vec<T>>
where
    T: Clone,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let batch_size = batch_size.max(1);
    let mut pending: VecDeque<&T> = items.iter().collect();
    let mut batches = Vec::new();

    while !pending.is_empty() {
        let mut batch = Vec::with_capacity(batch_size);
        let mut keys = HashSet::new();
        let mut deferred = Vec::new();

        while batch.len() < batch_size {
            let Some(item) = pending.pop_front() else {
                break;
            };
            if keys.insert(key(item)) {
                batch.push(item.clone());
            } else {
                deferred.push(item);
            }
        }

        for item in deferred.into_iter().rev() {
            pending.push_front(item);
        }
        batches.push(batch);
    }

    batches
}

/// Runs `task` over every planned batch.
///
/// Tasks inside a batch run concurrently; the next batch only starts once
/// every task of the current one has settled. `on_settled` receives the batch
/// index and its outcomes in item order. Returns the number of batches run.
pub async fn run_in_batches<'a, T, O, F, Fut, S>(
    batches: &'a [Vec<T>],
    mut task: F,
    mut on_settled: S,
) -> usize
where
    F: FnMut(&'a T) -> Fut,
    Fut: Future<Output = O>,
    S: FnMut(usize, Vec<O>),
{
    let mut settled = 0;
    for (index, batch) in batches.iter().enumerate() {
        let outcomes = join_all(batch.iter().map(&mut task)).await;
        on_settled(index, outcomes);
        settled += 1;
    }
    settled
}

/// Discovers, transforms and uploads every image under `config.source_dir`.
///
/// Only discovery and output directory problems are returned as errors; per-asset
/// failures end up in the returned [`RunStats`].
pub async fn run_pipeline(config: &Config, store: &dyn ObjectStore) -> Result<RunStats> {
    let start_time = Instant::now();

    let assets = discover_assets(&config.source_dir, Some(&config.output_dir))?;
    let mut stats = RunStats {
        total: assets.len(),
        ..RunStats::default()
    };

    if assets.is_empty() {
        warn!("No image files found in {:?}", config.source_dir);
        stats.elapsed = start_time.elapsed();
        return Ok(stats);
    }

    info!("📊 Found {} image files to process", assets.len());

    for variant in Variant::ALL {
        let dir = config.output_dir.join(variant.dir_name());
        fs::create_dir_all(&dir).map_err(|e| PublishError::OutputDirectory {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
    }

    warn_on_webp_collisions(&assets);
    warn_if_batches_exceed_memory(&assets, config.batch_size);

    // Assets sharing a WebP artifact must not be written concurrently
    let planned = plan_batches(&assets, config.batch_size, |asset| {
        variant_relative_path(&asset.relative_path, Variant::WebP)
    });
    let total_batches = planned.len();
    let progress = if tracing::enabled!(tracing::Level::INFO) {
        ProgressBar::new(assets.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::default_bar().template(PROGRESS_BAR_TEMPLATE) {
        progress.set_style(style.progress_chars("#>-"));
    }

    let batches = run_in_batches(
        &planned,
        |asset| process_asset(asset, config, store),
        |index, outcomes| {
            for outcome in &outcomes {
                stats.record(outcome);
            }
            progress.inc(outcomes.len() as u64);
            progress.suspend(|| {
                info!(
                    "📦 Batch {}/{} done ({} processed, {} skipped, {} errors so far)",
                    index + 1,
                    total_batches,
                    stats.processed,
                    stats.skipped,
                    stats.errors
                )
            });
        },
    )
    .await;
    stats.batches = batches;

    progress.finish_with_message("✅ Done");
    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Existence check, transform and upload for one asset. Never fails; every
/// problem is logged and reflected in the returned outcome.
pub async fn process_asset(
    asset: &ImageAsset,
    config: &Config,
    store: &dyn ObjectStore,
) -> AssetOutcome {
    let optimized_key = remote_key(&config.key_prefix, &asset.relative_path, Variant::Optimized);
    let webp_key = remote_key(&config.key_prefix, &asset.relative_path, Variant::WebP);

    let (optimized_exists, webp_exists) = if config.skip_existing {
        let policy = if config.skip_on_uncertain {
            UncertainPolicy::Skip
        } else {
            UncertainPolicy::Reupload
        };
        futures::join!(
            check_existing(store, &optimized_key, policy),
            check_existing(store, &webp_key, policy)
        )
    } else {
        (false, false)
    };

    if optimized_exists && webp_exists {
        info!("⏭️  Skipping {} (already in store)", asset.relative_path);
        return AssetOutcome::skipped();
    }

    let owned_asset = asset.clone();
    let output_dir = config.output_dir.clone();
    let settings = config.transform;
    let transformed =
        tokio::task::spawn_blocking(move || transform_asset(&owned_asset, &output_dir, settings))
            .await
            .map_err(PublishError::from)
            .and_then(|result| result);

    let result = match transformed {
        Ok(result) => result,
        Err(e) => {
            error!("Failed to process {}: {}", asset.relative_path, e);
            return AssetOutcome::failed();
        }
    };

    info!(
        "✅ {} ({}): {} → optimized {} → webp {} bytes",
        asset.relative_path, asset.kind, asset.size, result.optimized_size, result.webp_size
    );

    let upload_optimized = async {
        if optimized_exists {
            return None;
        }
        Some(upload_artifact(store, &result.optimized_path, &optimized_key, config.dry_run).await)
    };
    let upload_webp = async {
        if webp_exists {
            return None;
        }
        Some(upload_artifact(store, &result.webp_path, &webp_key, config.dry_run).await)
    };
    let (optimized_upload, webp_upload) = futures::join!(upload_optimized, upload_webp);

    let mut outcome = AssetOutcome {
        status: AssetStatus::Processed,
        original_bytes: asset.size,
        optimized_bytes: result.optimized_size,
        webp_bytes: result.webp_size,
        uploaded_optimized: false,
        uploaded_webp: false,
        upload_errors: 0,
    };

    for (variant, upload) in [(Variant::Optimized, optimized_upload), (Variant::WebP, webp_upload)] {
        match upload {
            None => {}
            Some(Ok(())) => match variant {
                Variant::Optimized => outcome.uploaded_optimized = true,
                Variant::WebP => outcome.uploaded_webp = true,
            },
            Some(Err(e)) => {
                error!(
                    "Failed to upload {} variant of {}: {}",
                    variant, asset.relative_path, e
                );
                outcome.upload_errors += 1;
            }
        }
    }

    outcome
}

/// `photo.jpg` and `photo.png` in one directory share a WebP key. They run in
/// separate batches and the later one's upload wins.
fn warn_on_webp_collisions(assets: &[ImageAsset]) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for asset in assets {
        let key = variant_relative_path(&asset.relative_path, Variant::WebP);
        if let Some(previous) = seen.insert(key.clone(), &asset.relative_path) {
            warn!(
                "{} and {} both map to {}; the later upload replaces the earlier",
                previous, asset.relative_path, key
            );
        }
    }
}

/// Rough decoded-size estimate: decoded pixels outweigh the compressed file.
fn estimate_image_memory_mib(asset: &ImageAsset) -> f64 {
    let file_size_mib = asset.size as f64 / (1024.0 * 1024.0);
    let multiplier = match asset.kind {
        ImageKind::Jpeg => 4.0,
        ImageKind::Png => 3.0,
        ImageKind::WebP => 3.5,
        ImageKind::Gif => 2.0,
    };
    // Two encodes of the decoded image are held at the same time
    file_size_mib * multiplier * 2.0
}

/// Peak estimated memory across batches, in MiB.
pub fn peak_batch_memory_mib(assets: &[ImageAsset], batch_size: usize) -> f64 {
    assets
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.iter().map(estimate_image_memory_mib).sum::<f64>())
        .fold(0.0, f64::max)
}

fn warn_if_batches_exceed_memory(assets: &[ImageAsset], batch_size: usize) {
    let peak_mib = peak_batch_memory_mib(assets, batch_size).ceil() as u64;

    let mut sys =
        System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
    sys.refresh_memory();
    let available_mib = sys.available_memory() / (1024 * 1024);

    if peak_mib + MIN_AVAILABLE_MEMORY_MIB > available_mib {
        warn!(
            "Largest batch may need ~{} MiB but only {} MiB is available; consider a smaller --batch-size",
            peak_mib, available_mib
        );
    }
}
