mod judge_internal;

use crate::errors::PipelineResult;
use crate::model::{AnalysisKind, AnalysisReport, FilingSection, Verdict};
use crate::providers::llm::LlmClient;
use std::sync::Arc;

/// Second-opinion review of a drafted report by an independent model.
#[derive(Clone)]
pub struct ReportJudge {
    client: Arc<dyn LlmClient>,
}

impl ReportJudge {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Review the exact rendered text of a draft. Call failures and output
    /// with no JSON are judge errors; an outcome other than `pass` or `fail`
    /// is a schema violation.
    pub async fn judge(
        &self,
        kind: AnalysisKind,
        section: &FilingSection,
        rendered_draft: &str,
    ) -> PipelineResult<Verdict> {
        judge_internal::client::call_judge_impl(self, kind, section, rendered_draft).await
    }

    pub async fn judge_report(
        &self,
        section: &FilingSection,
        draft: &AnalysisReport,
    ) -> PipelineResult<Verdict> {
        let kind = draft.kind();
        let rendered = draft
            .render()
            .map_err(|e| crate::errors::PipelineError::Judge {
                kind,
                message: format!("failed to render draft: {}", e),
            })?;
        self.judge(kind, section, &rendered).await
    }
}
