use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{FilingSource, Operator};
use crate::errors::{PipelineError, PipelineResult};
use crate::model::AcquiredFiling;
use crate::providers::edgar::FilingProvider;
use crate::storage::FilingStore;

/// Filings shown when confirming a ticker.
const RECENT_FILINGS_SHOWN: usize = 5;

/// Operator-driven acquisition: a cached filing if the operator picks one,
/// otherwise the latest 10-Q fetched live for a ticker.
pub struct InteractiveSource<O> {
    operator: O,
    provider: Arc<dyn FilingProvider>,
    store: FilingStore,
}

impl<O: Operator> InteractiveSource<O> {
    pub fn new(operator: O, provider: Arc<dyn FilingProvider>, store: FilingStore) -> Self {
        Self {
            operator,
            provider,
            store,
        }
    }

    pub fn operator_mut(&mut self) -> &mut O {
        &mut self.operator
    }

    /// `Ok(None)` when the operator asks for a live fetch instead.
    async fn from_cache(&mut self) -> PipelineResult<Option<AcquiredFiling>> {
        loop {
            let term = self.operator.input("Search the filing cache")?;
            let matches = self.store.search(&term).await?;
            if matches.is_empty() {
                self.operator
                    .show(&format!("No cached filings match '{}'.", term.trim()));
                continue;
            }

            for (i, name) in matches.iter().enumerate() {
                self.operator.show(&format!("{}: {}", i + 1, name));
            }
            if !self.operator.confirm("Is the filing you want listed?")? {
                continue;
            }

            let Some(index) = self
                .operator
                .select("Pick a filing (0 to fetch live instead)", &matches)?
            else {
                return Ok(None);
            };
            let file_name = matches.get(index).ok_or_else(|| {
                PipelineError::acquisition(format!("no cached filing at position {}", index + 1))
            })?;

            let (reference, document) = self.store.load(file_name).await?;
            let section = document.mda_section()?;
            info!(filing = %reference, "using cached filing");
            return Ok(Some(AcquiredFiling { reference, section }));
        }
    }

    async fn live(&mut self) -> PipelineResult<AcquiredFiling> {
        let company = loop {
            let ticker = self.operator.input("Ticker")?;
            if ticker.trim().is_empty() {
                continue;
            }

            let company = self.provider.quarterly_filings(&ticker).await?;
            self.operator
                .show(&format!("{} (CIK {})", company.name, company.cik));
            for entry in company.filings.iter().take(RECENT_FILINGS_SHOWN) {
                self.operator.show(&format!(
                    "  {} {} {}",
                    entry.filing_date, entry.form, entry.accession_number
                ));
            }
            if self.operator.confirm("Is this the right company?")? {
                break company;
            }
        };

        let entry = company.latest().ok_or_else(|| {
            PipelineError::acquisition(format!("{} has no 10-Q filings", company.name))
        })?;
        let reference = company.reference(entry)?;
        let document = self.provider.fetch_document(&company, entry).await?;
        let section = document.mda_section()?;

        if let Err(e) = self.store.save_if_absent(&reference, &document).await {
            warn!(error = %e, filing = %reference, "failed to cache filing");
        }

        info!(filing = %reference, "fetched live filing");
        Ok(AcquiredFiling { reference, section })
    }
}

#[async_trait]
impl<O: Operator> FilingSource for InteractiveSource<O> {
    async fn acquire(&mut self) -> PipelineResult<AcquiredFiling> {
        if self.operator.confirm("Use a cached filing?")? {
            match self.from_cache().await {
                Ok(Some(filing)) => return Ok(filing),
                Ok(None) => {}
                Err(e) if e.stops_run_loop() => return Err(e),
                Err(e) => {
                    warn!(error = %e, "cache lookup failed, fetching live");
                    self.operator
                        .show(&format!("Cache lookup failed ({}), fetching live.", e));
                }
            }
        }
        self.live().await
    }
}
