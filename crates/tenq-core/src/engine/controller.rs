use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use super::state::{
    CacheStatus, Draft, Event, IterationOutcome, KindState, PipelineState, RunSummary, Stage,
};
use crate::acquire::FilingSource;
use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::generator::AnalysisGenerator;
use crate::judge::ReportJudge;
use crate::model::{AcquiredFiling, FilingSection, Verdict};
use crate::providers::llm::build_client;
use crate::storage::ReportStore;

/// Called after every iteration of [`PipelineController::run_forever`].
pub type IterationSink = Arc<dyn Fn(&IterationOutcome) + Send + Sync>;

/// Sequences cache check, generation, judging and persistence for each kind.
#[derive(Clone)]
pub struct PipelineController {
    generator: AnalysisGenerator,
    judge: ReportJudge,
    reports: ReportStore,
}

impl PipelineController {
    pub fn new(generator: AnalysisGenerator, judge: ReportJudge, reports: ReportStore) -> Self {
        Self {
            generator,
            judge,
            reports,
        }
    }

    /// Build both model clients from configuration. Fails if a credential is missing.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        Ok(Self::new(
            AnalysisGenerator::new(build_client(&config.generator)?),
            ReportJudge::new(build_client(&config.judge)?),
            ReportStore::new(&config.output_dir),
        ))
    }

    pub fn reports(&self) -> &ReportStore {
        &self.reports
    }

    /// Run every kind for one filing, in order. Kind failures are recorded in
    /// the summary and never stop the remaining kinds.
    pub async fn run_filing(&self, filing: &AcquiredFiling) -> RunSummary {
        let mut state = PipelineState::new(filing, &self.reports);
        let span = info_span!(
            "pipeline.filing",
            company = %state.reference.company_name(),
            filing_date = %state.reference.filing_date()
        );

        async {
            for ks in state.kinds.iter_mut() {
                self.drive(&state.section, ks).await;
            }
        }
        .instrument(span)
        .await;

        RunSummary::from_state(state)
    }

    async fn drive(&self, section: &FilingSection, ks: &mut KindState) {
        let kind = ks.kind;
        while !ks.stage.is_terminal() {
            match ks.stage {
                Stage::CheckCache => {
                    if self.reports.exists(&ks.path).await {
                        ks.cache = CacheStatus::Present;
                        info!(kind = %kind, path = %ks.path.display(), "report exists, skipping");
                        ks.apply(Event::CacheHit);
                    } else {
                        ks.cache = CacheStatus::Absent;
                        ks.apply(Event::CacheMiss);
                    }
                }
                Stage::Generate => match self.generator.generate(kind, section).await {
                    Ok(report) => match report.render() {
                        Ok(rendered) => {
                            ks.draft = Some(Draft { report, rendered });
                            ks.apply(Event::Drafted);
                        }
                        Err(e) => ks.fail(PipelineError::Generation {
                            kind,
                            message: format!("failed to render report: {}", e),
                        }),
                    },
                    Err(e) => ks.fail(e),
                },
                Stage::Judge => {
                    let Some(draft) = ks.draft.as_ref() else {
                        ks.fail(PipelineError::Judge {
                            kind,
                            message: "no draft to review".to_string(),
                        });
                        continue;
                    };
                    let verdict = self.judge.judge(kind, section, &draft.rendered).await;
                    match verdict {
                        Ok(Verdict::Pass) => ks.apply(Event::Passed),
                        Ok(Verdict::Fail { anomalies }) => {
                            info!(kind = %kind, anomalies = %anomalies, "judge rejected report");
                            ks.anomalies = Some(anomalies);
                            ks.apply(Event::Rejected);
                        }
                        Err(e) => ks.fail(e),
                    }
                }
                Stage::Persist => {
                    let result = match ks.draft.as_ref() {
                        Some(draft) => self.reports.persist(&ks.path, &draft.rendered).await,
                        None => Err(PipelineError::store(&ks.path, "no judged draft to write")),
                    };
                    match result {
                        Ok(()) => ks.apply(Event::Written),
                        Err(e) => ks.fail(e),
                    }
                }
                Stage::Cached | Stage::Persisted | Stage::Rejected | Stage::Failed => {}
            }
        }

        if let Some(e) = &ks.error {
            warn!(kind = %kind, error = %e, "skipping kind for this filing");
        }
    }

    /// Acquire one filing and run it. Acquisition failures abort the iteration.
    pub async fn run_iteration<S>(&self, source: &mut S) -> IterationOutcome
    where
        S: FilingSource + ?Sized,
    {
        match source.acquire().await {
            Ok(filing) => IterationOutcome::Completed(self.run_filing(&filing).await),
            Err(e) => {
                warn!(error = %e, "acquisition failed, restarting");
                IterationOutcome::Aborted(e)
            }
        }
    }

    /// Repeat iterations until operator input closes, returning that error.
    pub async fn run_forever<S>(
        &self,
        source: &mut S,
        sink: Option<IterationSink>,
    ) -> PipelineError
    where
        S: FilingSource + ?Sized,
    {
        loop {
            let outcome = self.run_iteration(source).await;
            if let Some(sink) = &sink {
                sink(&outcome);
            }
            if let IterationOutcome::Aborted(e) = outcome {
                if e.stops_run_loop() {
                    return e;
                }
            }
        }
    }
}
