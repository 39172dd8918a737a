//! Generate-and-judge analysis pipeline for 10-Q filings.
//!
//! One iteration of the pipeline:
//!
//! - acquires a filing (local cache first, SEC EDGAR as fallback) and its
//!   Item 2 (MD&A) text
//! - for each analysis kind (revenue, cashflow, debt) in order: skips the kind
//!   when a report already exists on disk, otherwise drafts a report with the
//!   generator model and has an independent judge model review it
//! - writes the report only when the judge returns `pass`
//!
//! # Quick Start
//!
//! ```no_run
//! use tenq_core::{PipelineConfig, PipelineController};
//!
//! # async fn example(filing: tenq_core::AcquiredFiling) -> anyhow::Result<()> {
//! let config = PipelineConfig::from_env();
//! let controller = PipelineController::from_config(&config)?;
//! let summary = controller.run_filing(&filing).await;
//! for (kind, outcome) in summary.outcomes() {
//!     println!("{kind}: {outcome}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `OPENAI_API_KEY` | Credential for the generator model (OpenAI) |
//! | `GOOGLE_API_KEY` | Credential for the judge model (Gemini) |
//! | `TENQ_OUTPUT_DIR` | Report root (default: `output`) |
//! | `TENQ_CACHE_DIR` | Filing cache directory (default: `cache`) |
//! | `TENQ_GENERATOR_MODEL` | Generator model id (default: `gpt-5-mini`) |
//! | `TENQ_JUDGE_MODEL` | Judge model id (default: `gemini-2.5-flash`) |
//! | `TENQ_EDGAR_IDENTITY` | User-Agent identity sent to SEC EDGAR |
//! | `TENQ_HTTP_TIMEOUT` | Request timeout in seconds (default: 300) |
//! | `TENQ_MAX_RETRIES` | Max retries for transient failures (default: 2) |

pub mod acquire;
pub mod config;
pub mod engine;
pub mod errors;
pub mod generator;
pub mod judge;
pub mod model;
pub mod providers;
pub mod storage;

pub use acquire::{FilingSource, InteractiveSource, Operator};
pub use config::{EdgarConfig, ModelConfig, PipelineConfig};
pub use engine::{IterationOutcome, KindOutcome, PipelineController, RunSummary};
pub use errors::{PipelineError, PipelineResult};
pub use generator::AnalysisGenerator;
pub use judge::ReportJudge;
pub use model::{
    AcquiredFiling, AnalysisKind, AnalysisReport, CashflowReport, DebtReport, FilingDocument,
    FilingItem, FilingReference, FilingSection, ItemKey, RevenueReport, Verdict, VerdictOutcome,
};
pub use storage::{FilingStore, ReportStore};
