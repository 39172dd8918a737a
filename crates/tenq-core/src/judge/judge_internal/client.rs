use crate::errors::{PipelineError, PipelineResult};
use crate::judge::ReportJudge;
use crate::model::{AnalysisKind, FilingSection, Verdict, VerdictOutcome};
use crate::providers::llm::first_json_value;

pub(crate) async fn call_judge_impl(
    judge: &ReportJudge,
    kind: AnalysisKind,
    section: &FilingSection,
    draft: &str,
) -> PipelineResult<Verdict> {
    let prompt = super::prompt::build_prompt(kind, section, draft);
    let system = [super::prompt::SYSTEM_PROMPT.to_string()];

    let resp = judge
        .client
        .complete(&prompt, Some(&system))
        .await
        .map_err(|e| PipelineError::Judge {
            kind,
            message: e.to_string(),
        })?;

    let val = first_json_value(&resp.text).map_err(|e| PipelineError::Judge {
        kind,
        message: e.to_string(),
    })?;

    parse_verdict(kind, &val)
}

pub(crate) fn parse_verdict(kind: AnalysisKind, val: &serde_json::Value) -> PipelineResult<Verdict> {
    let outcome = val
        .get("passorfail")
        .and_then(|v| v.as_str())
        .ok_or_else(|| PipelineError::SchemaViolation {
            kind,
            detail: "judge JSON missing 'passorfail' field".to_string(),
        })?
        .parse::<VerdictOutcome>()
        .map_err(|detail| PipelineError::SchemaViolation { kind, detail })?;

    Ok(match outcome {
        VerdictOutcome::Pass => Verdict::Pass,
        VerdictOutcome::Fail => Verdict::Fail {
            anomalies: val
                .get("anomalies")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .trim()
                .to_string(),
        },
    })
}
