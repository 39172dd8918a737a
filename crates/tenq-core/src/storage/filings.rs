use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::errors::{PipelineError, PipelineResult};
use crate::model::{FilingDocument, FilingReference};

/// Directory of cached 10-Q snapshots, one `{company}_{form}_{date}.json` per filing.
#[derive(Debug, Clone)]
pub struct FilingStore {
    root: PathBuf,
}

impl FilingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, reference: &FilingReference) -> PathBuf {
        self.root.join(reference.cache_file_name())
    }

    /// Cached file names containing `term` (case-insensitive), sorted.
    /// A missing cache directory yields an empty list.
    pub async fn search(&self, term: &str) -> PipelineResult<Vec<String>> {
        let needle = term.trim().to_lowercase();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PipelineError::store(&self.root, e)),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PipelineError::store(&self.root, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && name.to_lowercase().contains(&needle) {
                matches.push(name);
            }
        }
        matches.sort();

        debug!(term = %term, count = matches.len(), "searched filing cache");
        Ok(matches)
    }

    /// Load a cached filing by file name.
    pub async fn load(&self, file_name: &str) -> PipelineResult<(FilingReference, FilingDocument)> {
        let reference = FilingReference::from_cache_file_name(file_name)?;
        let path = self.root.join(file_name);

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::store(&path, format!("failed to read cached filing: {}", e)))?;
        let document: FilingDocument = serde_json::from_str(&content)
            .map_err(|e| PipelineError::store(&path, format!("invalid cached filing: {}", e)))?;

        Ok((reference, document))
    }

    /// Write the snapshot unless one is already cached. Returns whether a file was written.
    pub async fn save_if_absent(
        &self,
        reference: &FilingReference,
        document: &FilingDocument,
    ) -> PipelineResult<bool> {
        let path = self.path_for(reference);
        if super::exists(&path).await {
            debug!(path = %path.display(), "filing already cached");
            return Ok(false);
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| PipelineError::store(&path, format!("failed to serialize filing: {}", e)))?;
        super::write_atomic(&path, &json).await?;

        info!(path = %path.display(), "cached filing");
        Ok(true)
    }
}
