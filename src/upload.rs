use crate::constants::CACHE_CONTROL;
use crate::error::Result;
use crate::formats::content_type_for;
use crate::store::ObjectStore;
use std::path::Path;
use tracing::{debug, info, warn};

/// How an existence check that failed outright is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertainPolicy {
    /// Upload again.
    Reupload,
    /// Assume the object is already there.
    Skip,
}

/// Asks the store whether `key` exists, resolving check failures per `policy`.
pub async fn check_existing(store: &dyn ObjectStore, key: &str, policy: UncertainPolicy) -> bool {
    match store.head_exists(key).await {
        Ok(exists) => {
            debug!("{} {}", key, if exists { "exists" } else { "is new" });
            exists
        }
        Err(e) => {
            let assume_exists = policy == UncertainPolicy::Skip;
            warn!(
                "Existence check failed ({}), {}",
                e,
                if assume_exists {
                    "skipping upload"
                } else {
                    "uploading anyway"
                }
            );
            assume_exists
        }
    }
}

/// Uploads one local artifact under `key` with the long-lived cache directive.
///
/// With `dry_run` the store is never written to; the key is logged and the
/// call reports success so it is counted like a real upload.
pub async fn upload_artifact(
    store: &dyn ObjectStore,
    local_path: &Path,
    key: &str,
    dry_run: bool,
) -> Result<()> {
    let content_type = content_type_for(key);

    if dry_run {
        info!("[DRY RUN] Would upload {} ({})", key, content_type);
        return Ok(());
    }

    let body = tokio::fs::read(local_path).await?;
    let size = body.len();
    store
        .put_object(key, body, content_type, CACHE_CONTROL)
        .await?;

    info!("📤 Uploaded {} ({} bytes) → {}", key, size, store.object_url(key));
    Ok(())
}
