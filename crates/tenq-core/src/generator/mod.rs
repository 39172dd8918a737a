//! Analysis generator: one model call per (kind, filing section), parsed into
//! the kind's exact report schema.

mod prompt;

use std::sync::Arc;

use tracing::debug;

use crate::errors::{PipelineError, PipelineResult};
use crate::model::{AnalysisKind, AnalysisReport, FilingSection};
use crate::providers::llm::{first_json_value, LlmClient};

#[derive(Clone)]
pub struct AnalysisGenerator {
    client: Arc<dyn LlmClient>,
}

impl AnalysisGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Draft a report. Model failures and output that does not fit the
    /// schema of `kind` are both generation errors.
    pub async fn generate(
        &self,
        kind: AnalysisKind,
        section: &FilingSection,
    ) -> PipelineResult<AnalysisReport> {
        let prompt = prompt::build_prompt(kind, section);
        let system = [prompt::SYSTEM_PROMPT.to_string()];

        let resp = self
            .client
            .complete(&prompt, Some(&system))
            .await
            .map_err(|e| PipelineError::Generation {
                kind,
                message: e.to_string(),
            })?;
        debug!(kind = %kind, model = %resp.model, "draft received");

        let value = first_json_value(&resp.text).map_err(|e| PipelineError::Generation {
            kind,
            message: e.to_string(),
        })?;

        AnalysisReport::from_value(kind, value).map_err(|detail| PipelineError::Generation {
            kind,
            message: format!("report does not match the {} schema: {}", kind, detail),
        })
    }
}
