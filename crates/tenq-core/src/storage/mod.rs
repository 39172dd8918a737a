//! Flat-file stores: the filing cache and the report output tree.

mod filings;
mod reports;

pub use filings::FilingStore;
pub use reports::ReportStore;

use std::path::Path;

use tokio::fs;

use crate::errors::{PipelineError, PipelineResult};

/// Write `content` next to `path` and rename it into place, creating parent
/// directories first.
pub(crate) async fn write_atomic(path: &Path, content: &str) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::store(parent, format!("failed to create directory: {}", e)))?;
    }

    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)
        .await
        .map_err(|e| PipelineError::store(&temp_path, format!("failed to write temp file: {}", e)))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| PipelineError::store(path, format!("failed to rename temp file: {}", e)))?;

    Ok(())
}

/// Existence check that treats an unreadable location as absent.
pub(crate) async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
