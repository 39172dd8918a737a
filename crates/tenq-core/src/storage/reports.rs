use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::errors::{PipelineError, PipelineResult};
use crate::model::{is_filing_date, sanitize_component, AnalysisKind, FilingReference};

/// Output tree of accepted reports:
/// `{root}/{company}/{filing_date}/{kind}_{filing_date}.json`.
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, reference: &FilingReference, kind: AnalysisKind) -> PathBuf {
        let date = reference.filing_date();
        self.root
            .join(sanitize_component(reference.company_name()))
            .join(date)
            .join(format!("{}_{}.json", kind, date))
    }

    pub async fn exists(&self, path: &Path) -> bool {
        super::exists(path).await
    }

    /// Write the rendered report verbatim.
    pub async fn persist(&self, path: &Path, rendered: &str) -> PipelineResult<()> {
        super::write_atomic(path, rendered).await?;
        info!(path = %path.display(), "persisted report");
        Ok(())
    }

    pub async fn load(&self, path: &Path) -> PipelineResult<String> {
        fs::read_to_string(path)
            .await
            .map_err(|e| PipelineError::store(path, format!("failed to read report: {}", e)))
    }

    /// Stored report files for a company, optionally limited to one filing date,
    /// sorted by path. The date must be `YYYY-MM-DD`.
    pub async fn list(&self, company: &str, date: Option<&str>) -> PipelineResult<Vec<PathBuf>> {
        let company_dir = self.root.join(sanitize_component(company));
        let date_dirs = match date {
            Some(date) if is_filing_date(date) => vec![company_dir.join(date)],
            Some(date) => {
                return Err(PipelineError::Config {
                    message: format!("invalid filing date '{}', expected YYYY-MM-DD", date),
                })
            }
            None => list_dir(&company_dir, true).await?,
        };

        let mut reports = Vec::new();
        for dir in date_dirs {
            reports.extend(
                list_dir(&dir, false)
                    .await?
                    .into_iter()
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json")),
            );
        }
        reports.sort();
        Ok(reports)
    }
}

/// Entries of `dir` that are directories (or files). A missing directory is empty.
async fn list_dir(dir: &Path, directories: bool) -> PipelineResult<Vec<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PipelineError::store(dir, e)),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::store(dir, e))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map_err(|e| PipelineError::store(entry.path(), e))?
            .is_dir();
        if is_dir == directories {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn acme() -> FilingReference {
        FilingReference::new("ACME", "10-Q", "2024-06-30").unwrap()
    }

    #[test]
    fn path_layout() {
        let store = ReportStore::new("output");
        assert_eq!(
            store.path_for(&acme(), AnalysisKind::Cashflow),
            PathBuf::from("output/ACME/2024-06-30/cashflow_2024-06-30.json")
        );
    }

    #[test]
    fn company_name_cannot_escape_root() {
        let store = ReportStore::new("output");
        let reference = FilingReference::new("../APPLE INC /CA/", "10-Q", "2024-06-30").unwrap();
        let path = store.path_for(&reference, AnalysisKind::Debt);
        assert_eq!(
            path,
            PathBuf::from("output/..-APPLE INC -CA-/2024-06-30/debt_2024-06-30.json")
        );
    }

    #[tokio::test]
    async fn persist_creates_parents_and_keeps_bytes() {
        let tmp = TempDir::new().unwrap();
        let store = ReportStore::new(tmp.path());
        let path = store.path_for(&acme(), AnalysisKind::Revenue);
        let rendered = "{\n  \"company name\": \"ACME\"\n}";

        assert!(!store.exists(&path).await);
        store.persist(&path, rendered).await.unwrap();
        assert!(store.exists(&path).await);
        assert_eq!(store.load(&path).await.unwrap(), rendered);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn list_filters_by_date() {
        let tmp = TempDir::new().unwrap();
        let store = ReportStore::new(tmp.path());
        let q2 = acme();
        let q1 = FilingReference::new("ACME", "10-Q", "2024-03-31").unwrap();

        for (reference, kind) in [
            (&q2, AnalysisKind::Revenue),
            (&q2, AnalysisKind::Debt),
            (&q1, AnalysisKind::Cashflow),
        ] {
            store
                .persist(&store.path_for(reference, kind), "{}")
                .await
                .unwrap();
        }

        assert_eq!(store.list("ACME", None).await.unwrap().len(), 3);
        let q2_only = store.list("ACME", Some("2024-06-30")).await.unwrap();
        assert_eq!(q2_only.len(), 2);
        assert!(q2_only[0].ends_with("debt_2024-06-30.json"));
        assert!(store.list("OTHER", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_rejects_dates_that_are_not_calendar_days() {
        let tmp = TempDir::new().unwrap();
        let store = ReportStore::new(tmp.path().join("output"));
        std::fs::write(tmp.path().join("secret.json"), "{}").unwrap();

        for date in ["../..", "..", "2024-06-30/..", "2024-02-30", "2024-6-30"] {
            let err = store.list("ACME", Some(date)).await.unwrap_err();
            assert!(matches!(err, PipelineError::Config { .. }), "{}", date);
        }
    }
}
