//! Run statistics and the end-of-run summary.

use std::time::Duration;

/// What happened to one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    Processed,
    Skipped,
    Failed,
}

/// Result of one per-asset pipeline, folded into [`RunStats`] by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOutcome {
    pub status: AssetStatus,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub webp_bytes: u64,
    pub uploaded_optimized: bool,
    pub uploaded_webp: bool,
    pub upload_errors: u64,
}

impl AssetOutcome {
    pub fn skipped() -> Self {
        Self::with_status(AssetStatus::Skipped)
    }

    pub fn failed() -> Self {
        Self::with_status(AssetStatus::Failed)
    }

    fn with_status(status: AssetStatus) -> Self {
        Self {
            status,
            original_bytes: 0,
            optimized_bytes: 0,
            webp_bytes: 0,
            uploaded_optimized: false,
            uploaded_webp: false,
            upload_errors: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    /// Transform failures plus failed uploads.
    pub errors: usize,
    pub batches: usize,
    /// Source bytes of the processed assets.
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub webp_bytes: u64,
    /// Counted for dry-run "would upload" as well.
    pub uploaded_optimized: usize,
    pub uploaded_webp: usize,
    pub elapsed: Duration,
}

impl RunStats {
    pub fn record(&mut self, outcome: &AssetOutcome) {
        match outcome.status {
            AssetStatus::Processed => {
                self.processed += 1;
                self.original_bytes += outcome.original_bytes;
                self.optimized_bytes += outcome.optimized_bytes;
                self.webp_bytes += outcome.webp_bytes;
            }
            AssetStatus::Skipped => self.skipped += 1,
            AssetStatus::Failed => self.errors += 1,
        }
        self.errors += outcome.upload_errors as usize;
        self.uploaded_optimized += usize::from(outcome.uploaded_optimized);
        self.uploaded_webp += usize::from(outcome.uploaded_webp);
    }

    pub fn uploaded(&self) -> usize {
        self.uploaded_optimized + self.uploaded_webp
    }

    pub fn optimized_reduction(&self) -> f64 {
        reduction_percent(self.original_bytes, self.optimized_bytes)
    }

    pub fn webp_reduction(&self) -> f64 {
        reduction_percent(self.original_bytes, self.webp_bytes)
    }
}

/// Percentage saved by `derived` relative to `original`, within `[0, 100]`.
///
/// An empty original yields 0. A derived file larger than the original also
/// yields 0.
pub fn reduction_percent(original: u64, derived: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let ratio = (original as f64 - derived as f64) / original as f64 * 100.0;
    ratio.clamp(0.0, 100.0)
}

/// Format file size in human-readable format, e.g. "1.2 MB".
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn render_summary(stats: &RunStats, dry_run: bool) -> String {
    let upload_label = if dry_run { "Would upload" } else { "Uploaded" };
    let mut lines = vec![
        "📊 Summary:".to_string(),
        format!("  📁 Total images found: {}", stats.total),
        format!("  ✅ Processed: {}", stats.processed),
        format!("  ⏭️  Skipped (already in store): {}", stats.skipped),
        format!("  ❌ Errors: {}", stats.errors),
        String::new(),
        "📦 Size comparison:".to_string(),
        format!("  Original:  {}", format_file_size(stats.original_bytes)),
        format!(
            "  Optimized: {} ({:.1}% reduction)",
            format_file_size(stats.optimized_bytes),
            stats.optimized_reduction()
        ),
        format!(
            "  WebP:      {} ({:.1}% reduction)",
            format_file_size(stats.webp_bytes),
            stats.webp_reduction()
        ),
        String::new(),
        format!("📤 {}:", upload_label),
        format!("  Original format: {}", stats.uploaded_optimized),
        format!("  WebP format:     {}", stats.uploaded_webp),
        format!(
            "⏱️  {} batch(es) in {:.2?}",
            stats.batches, stats.elapsed
        ),
    ];

    if stats.errors > 0 {
        lines.push(format!(
            "⚠️  {} error(s) occurred, see the log above for details",
            stats.errors
        ));
    }
    if dry_run {
        lines.push("💡 Dry run: nothing was written to the bucket".to_string());
    }

    lines.join("\n")
}

pub fn print_summary(stats: &RunStats, dry_run: bool) {
    println!("\n{}", render_summary(stats, dry_run));
}
