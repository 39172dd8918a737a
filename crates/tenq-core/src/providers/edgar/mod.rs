//! SEC EDGAR filings provider.
//!
//! Resolves a ticker through `company_tickers.json`, lists the company's
//! 10-Q filings from the submissions API, and splits the primary document of
//! a filing into its items.

pub mod sections;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::EdgarConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::model::{FilingDocument, FilingReference};

/// Form type the pipeline analyzes.
pub const QUARTERLY_FORM: &str = "10-Q";

/// One filing from a company's submission history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingEntry {
    pub accession_number: String,
    pub form: String,
    pub filing_date: String,
    pub primary_document: String,
}

/// A resolved company and its 10-Q filings, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyFilings {
    pub ticker: String,
    pub cik: u64,
    pub name: String,
    pub filings: Vec<FilingEntry>,
}

impl CompanyFilings {
    pub fn latest(&self) -> Option<&FilingEntry> {
        self.filings.first()
    }

    pub fn reference(&self, entry: &FilingEntry) -> PipelineResult<FilingReference> {
        FilingReference::new(&self.name, &entry.form, &entry.filing_date)
    }
}

/// Source of live filings (ticker → 10-Q list → item text).
#[async_trait]
pub trait FilingProvider: Send + Sync {
    async fn quarterly_filings(&self, ticker: &str) -> PipelineResult<CompanyFilings>;

    async fn fetch_document(
        &self,
        company: &CompanyFilings,
        entry: &FilingEntry,
    ) -> PipelineResult<FilingDocument>;
}

#[derive(Debug, Deserialize)]
struct TickerRow {
    cik_str: u64,
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct Submissions {
    name: String,
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    recent: RecentFilings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    accession_number: Vec<String>,
    filing_date: Vec<String>,
    form: Vec<String>,
    primary_document: Vec<String>,
}

impl RecentFilings {
    fn quarterly(self) -> Vec<FilingEntry> {
        let mut entries: Vec<FilingEntry> = self
            .accession_number
            .into_iter()
            .zip(self.filing_date)
            .zip(self.form)
            .zip(self.primary_document)
            .filter(|(((_, _), form), _)| form == QUARTERLY_FORM)
            .map(
                |(((accession_number, filing_date), form), primary_document)| FilingEntry {
                    accession_number,
                    form,
                    filing_date,
                    primary_document,
                },
            )
            .collect();
        entries.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));
        entries
    }
}

/// EDGAR HTTP client.
pub struct EdgarClient {
    client: reqwest::Client,
    config: EdgarConfig,
    tickers: OnceCell<HashMap<String, u64>>,
}

impl EdgarClient {
    pub fn from_config(config: &EdgarConfig) -> PipelineResult<Self> {
        let identity = config.identity.trim();
        if identity.is_empty() {
            return Err(PipelineError::Config {
                message: "EDGAR requires an identity (set TENQ_EDGAR_IDENTITY to 'Name email')"
                    .to_string(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(identity).map_err(|e| PipelineError::Config {
                message: format!("invalid EDGAR identity: {}", e),
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| PipelineError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
            tickers: OnceCell::new(),
        })
    }

    async fn get(&self, url: &str) -> PipelineResult<reqwest::Response> {
        debug!(url = %url, "EDGAR request");
        crate::providers::http::send_with_retry(
            || self.client.get(url),
            url,
            self.config.max_retries,
        )
        .await
        .map_err(|e| PipelineError::acquisition(e.to_string()))
    }

    async fn ticker_map(&self) -> PipelineResult<&HashMap<String, u64>> {
        self.tickers
            .get_or_try_init(|| async {
                let url = format!(
                    "{}/files/company_tickers.json",
                    self.config.www_url.trim_end_matches('/')
                );
                let rows: HashMap<String, TickerRow> =
                    self.get(&url).await?.json().await.map_err(|e| {
                        PipelineError::acquisition(format!("invalid ticker list: {}", e))
                    })?;
                Ok::<_, PipelineError>(
                    rows.into_values()
                        .map(|row| (row.ticker.to_ascii_lowercase(), row.cik_str))
                        .collect(),
                )
            })
            .await
    }

    pub async fn resolve_cik(&self, ticker: &str) -> PipelineResult<u64> {
        let key = ticker.trim().to_ascii_lowercase();
        self.ticker_map().await?.get(&key).copied().ok_or_else(|| {
            PipelineError::acquisition(format!("unknown ticker '{}'", ticker.trim()))
        })
    }
}

#[async_trait]
impl FilingProvider for EdgarClient {
    async fn quarterly_filings(&self, ticker: &str) -> PipelineResult<CompanyFilings> {
        let cik = self.resolve_cik(ticker).await?;
        let url = format!(
            "{}/submissions/CIK{:010}.json",
            self.config.data_url.trim_end_matches('/'),
            cik
        );
        let submissions: Submissions = self.get(&url).await?.json().await.map_err(|e| {
            PipelineError::acquisition(format!("invalid submissions for CIK {}: {}", cik, e))
        })?;

        let filings = submissions.filings.recent.quarterly();
        debug!(cik, count = filings.len(), "resolved quarterly filings");

        Ok(CompanyFilings {
            ticker: ticker.trim().to_ascii_lowercase(),
            cik,
            name: submissions.name,
            filings,
        })
    }

    async fn fetch_document(
        &self,
        company: &CompanyFilings,
        entry: &FilingEntry,
    ) -> PipelineResult<FilingDocument> {
        let url = format!(
            "{}/Archives/edgar/data/{}/{}/{}",
            self.config.www_url.trim_end_matches('/'),
            company.cik,
            entry.accession_number.replace('-', ""),
            entry.primary_document
        );
        let html = self
            .get(&url)
            .await?
            .text()
            .await
            .map_err(|e| PipelineError::acquisition(format!("failed to read {}: {}", url, e)))?;

        let items = sections::split_items(&sections::html_to_text(&html));
        if items.len() < 2 {
            return Err(PipelineError::acquisition(format!(
                "no 10-Q items found in {} filing {}; this document layout is not supported",
                company.ticker, entry.accession_number
            )));
        }

        Ok(FilingDocument::from_items(
            &company.ticker,
            &entry.form,
            items,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EdgarClient {
        let config = EdgarConfig {
            identity: "Jane Doe jane@example.com".to_string(),
            www_url: server.uri(),
            data_url: server.uri(),
            max_retries: 0,
            ..EdgarConfig::default()
        };
        EdgarClient::from_config(&config).unwrap()
    }

    async fn mount_company(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .and(header("user-agent", "Jane Doe jane@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "0": { "cik_str": 1234, "ticker": "ACME", "title": "ACME Corp" }
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "ACME Corp",
                "filings": { "recent": {
                    "accessionNumber": ["0001-24-000003", "0001-24-000002", "0001-24-000001"],
                    "filingDate": ["2024-08-01", "2024-07-15", "2024-05-01"],
                    "form": ["8-K", "10-Q", "10-Q"],
                    "primaryDocument": ["ex.htm", "acme-q2.htm", "acme-q1.htm"]
                }}
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn identity_is_required() {
        let err = EdgarClient::from_config(&EdgarConfig::default()).err().unwrap();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[tokio::test]
    async fn lists_quarterly_filings_newest_first() {
        let server = MockServer::start().await;
        mount_company(&server).await;

        let company = client_for(&server).quarterly_filings("acme").await.unwrap();
        assert_eq!(company.cik, 1234);
        assert_eq!(company.name, "ACME Corp");
        assert_eq!(company.filings.len(), 2);
        let latest = company.latest().unwrap();
        assert_eq!(latest.filing_date, "2024-07-15");
        assert_eq!(
            company.reference(latest).unwrap().cache_file_name(),
            "ACME Corp_10-Q_2024-07-15.json"
        );
    }

    #[tokio::test]
    async fn unknown_ticker_is_acquisition_error() {
        let server = MockServer::start().await;
        mount_company(&server).await;

        let err = client_for(&server)
            .quarterly_filings("zzzz")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Acquisition { .. }));
    }

    #[tokio::test]
    async fn fetches_and_splits_primary_document() {
        let server = MockServer::start().await;
        mount_company(&server).await;
        Mock::given(method("GET"))
            .and(path("/Archives/edgar/data/1234/000124000002/acme-q2.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body>\
                 <p>PART I</p>\
                 <p>Item 1. Financial Statements</p><p>Balance sheet.</p>\
                 <p>Item 2. Management&#8217;s Discussion and Analysis</p>\
                 <p>Revenue grew 8%.</p>\
                 <p>Item 3. Market Risk</p><p>Limited.</p>\
                 </body></html>",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let company = client.quarterly_filings("ACME").await.unwrap();
        let doc = client
            .fetch_document(&company, company.latest().unwrap())
            .await
            .unwrap();

        assert_eq!(doc.ticker, "acme");
        assert_eq!(doc.form, "10-Q");
        assert_eq!(doc.items.len(), 3);
        assert_eq!(doc.mda_section().unwrap().as_str(), "Revenue grew 8%.");
    }
}
