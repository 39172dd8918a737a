//! Per-kind pipeline state machine.
//!
//! ```text
//! CheckCache --CacheHit--> Cached
//! CheckCache --CacheMiss--> Generate --Drafted--> Judge --Passed--> Persist --Written--> Persisted
//!                                                  Judge --Rejected--> Rejected
//! Generate | Judge | Persist --Error--> Failed
//! ```

use std::fmt;
use std::path::PathBuf;

use crate::errors::PipelineError;
use crate::model::{AcquiredFiling, AnalysisKind, AnalysisReport, FilingReference, FilingSection};
use crate::storage::ReportStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckCache,
    Generate,
    Judge,
    Persist,
    Cached,
    Persisted,
    Rejected,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Stage::Cached | Stage::Persisted | Stage::Rejected | Stage::Failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CacheHit,
    CacheMiss,
    Drafted,
    Passed,
    Rejected,
    Written,
    Error,
}

/// Next stage, or `None` if `event` is not valid in `stage`.
pub fn transition(stage: Stage, event: Event) -> Option<Stage> {
    use Event as E;
    use Stage as S;

    match (stage, event) {
        (S::CheckCache, E::CacheHit) => Some(S::Cached),
        (S::CheckCache, E::CacheMiss) => Some(S::Generate),
        (S::Generate, E::Drafted) => Some(S::Judge),
        (S::Judge, E::Passed) => Some(S::Persist),
        (S::Judge, E::Rejected) => Some(S::Rejected),
        (S::Persist, E::Written) => Some(S::Persisted),
        (S::Generate | S::Judge | S::Persist, E::Error) => Some(S::Failed),
        _ => None,
    }
}

/// Result of the cache check. Set exactly once, before any model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Unchecked,
    Present,
    Absent,
}

/// A generated report and the exact text the judge reviews and the store writes.
#[derive(Debug, Clone)]
pub struct Draft {
    pub report: AnalysisReport,
    pub rendered: String,
}

#[derive(Debug)]
pub struct KindState {
    pub kind: AnalysisKind,
    pub path: PathBuf,
    pub stage: Stage,
    pub cache: CacheStatus,
    pub draft: Option<Draft>,
    pub anomalies: Option<String>,
    pub error: Option<PipelineError>,
}

impl KindState {
    pub fn new(kind: AnalysisKind, path: PathBuf) -> Self {
        Self {
            kind,
            path,
            stage: Stage::CheckCache,
            cache: CacheStatus::Unchecked,
            draft: None,
            anomalies: None,
            error: None,
        }
    }

    pub fn apply(&mut self, event: Event) {
        match transition(self.stage, event) {
            Some(next) => self.stage = next,
            None => {
                let message = format!("no transition from {:?} on {:?}", self.stage, event);
                self.error.get_or_insert(PipelineError::Transition {
                    kind: self.kind,
                    message,
                });
                self.stage = Stage::Failed;
            }
        }
    }

    pub fn fail(&mut self, error: PipelineError) {
        self.error = Some(error);
        self.apply(Event::Error);
    }

    pub fn into_outcome(self) -> KindOutcome {
        match self.stage {
            Stage::Cached => KindOutcome::Cached { path: self.path },
            Stage::Persisted => KindOutcome::Persisted { path: self.path },
            Stage::Rejected => KindOutcome::Rejected {
                anomalies: self.anomalies.unwrap_or_default(),
            },
            stage => KindOutcome::Failed {
                error: self.error.unwrap_or_else(|| PipelineError::Transition {
                    kind: self.kind,
                    message: format!("stopped in {:?}", stage),
                }),
            },
        }
    }
}

/// Context of one iteration. Built fresh from each acquired filing.
#[derive(Debug)]
pub struct PipelineState {
    pub reference: FilingReference,
    pub section: FilingSection,
    pub kinds: Vec<KindState>,
}

impl PipelineState {
    pub fn new(filing: &AcquiredFiling, reports: &ReportStore) -> Self {
        let kinds = AnalysisKind::ALL
            .iter()
            .map(|&kind| KindState::new(kind, reports.path_for(&filing.reference, kind)))
            .collect();
        Self {
            reference: filing.reference.clone(),
            section: filing.section.clone(),
            kinds,
        }
    }
}

/// How one kind ended.
#[derive(Debug)]
pub enum KindOutcome {
    /// A report already existed; nothing was generated or judged.
    Cached { path: PathBuf },
    /// Judge passed the draft and it was written.
    Persisted { path: PathBuf },
    /// Judge failed the draft; nothing was written.
    Rejected { anomalies: String },
    /// Generation, judging or persisting failed; nothing was written.
    Failed { error: PipelineError },
}

impl KindOutcome {
    /// Report file on disk after this iteration, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            KindOutcome::Cached { path } | KindOutcome::Persisted { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for KindOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindOutcome::Cached { path } => write!(f, "already exists at {}", path.display()),
            KindOutcome::Persisted { path } => write!(f, "passed, saved to {}", path.display()),
            KindOutcome::Rejected { anomalies } if anomalies.is_empty() => {
                write!(f, "failed review")
            }
            KindOutcome::Rejected { anomalies } => write!(f, "failed review: {}", anomalies),
            KindOutcome::Failed { error } => write!(f, "error: {}", error),
        }
    }
}

/// Outcomes of one iteration, in processing order.
#[derive(Debug)]
pub struct RunSummary {
    pub reference: FilingReference,
    outcomes: Vec<(AnalysisKind, KindOutcome)>,
}

impl RunSummary {
    pub fn from_state(state: PipelineState) -> Self {
        Self {
            reference: state.reference,
            outcomes: state
                .kinds
                .into_iter()
                .map(|ks| (ks.kind, ks.into_outcome()))
                .collect(),
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (AnalysisKind, &KindOutcome)> {
        self.outcomes.iter().map(|(kind, outcome)| (*kind, outcome))
    }

    pub fn outcome(&self, kind: AnalysisKind) -> Option<&KindOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, outcome)| outcome)
    }

    /// Error of the first kind that failed, in processing order.
    pub fn first_error(&self) -> Option<&PipelineError> {
        self.outcomes.iter().find_map(|(_, outcome)| match outcome {
            KindOutcome::Failed { error } => Some(error),
            _ => None,
        })
    }

    pub fn persisted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, KindOutcome::Persisted { .. }))
            .count()
    }
}

/// Result of one acquire-and-run pass.
#[derive(Debug)]
pub enum IterationOutcome {
    Completed(RunSummary),
    Aborted(PipelineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_short_circuits_to_terminal() {
        let next = transition(Stage::CheckCache, Event::CacheHit).unwrap();
        assert_eq!(next, Stage::Cached);
        assert!(next.is_terminal());
        for event in [Event::Drafted, Event::Passed, Event::Written, Event::Error] {
            assert_eq!(transition(next, event), None);
        }
    }

    #[test]
    fn happy_path_reaches_persisted() {
        let mut stage = Stage::CheckCache;
        for event in [Event::CacheMiss, Event::Drafted, Event::Passed, Event::Written] {
            stage = transition(stage, event).unwrap();
        }
        assert_eq!(stage, Stage::Persisted);
    }

    #[test]
    fn errors_only_leave_working_stages() {
        assert_eq!(transition(Stage::CheckCache, Event::Error), None);
        for stage in [Stage::Generate, Stage::Judge, Stage::Persist] {
            assert_eq!(transition(stage, Event::Error), Some(Stage::Failed));
        }
    }

    #[test]
    fn persisting_requires_a_pass() {
        assert_eq!(transition(Stage::Generate, Event::Passed), None);
        assert_eq!(transition(Stage::Generate, Event::Written), None);
        assert_eq!(transition(Stage::Judge, Event::Written), None);
        assert_eq!(
            transition(Stage::Judge, Event::Rejected),
            Some(Stage::Rejected)
        );
    }

    #[test]
    fn summary_reports_first_failed_kind() {
        let reference = FilingReference::new("ACME", "10-Q", "2024-07-15").unwrap();
        let mut revenue = KindState::new(AnalysisKind::Revenue, PathBuf::from("r.json"));
        revenue.apply(Event::CacheHit);
        let mut cashflow = KindState::new(AnalysisKind::Cashflow, PathBuf::from("c.json"));
        cashflow.apply(Event::CacheMiss);
        cashflow.apply(Event::Drafted);
        cashflow.fail(PipelineError::SchemaViolation {
            kind: AnalysisKind::Cashflow,
            detail: "maybe".into(),
        });
        let mut debt = KindState::new(AnalysisKind::Debt, PathBuf::from("d.json"));
        debt.apply(Event::CacheMiss);
        debt.fail(PipelineError::Generation {
            kind: AnalysisKind::Debt,
            message: "timeout".into(),
        });

        let summary = RunSummary::from_state(PipelineState {
            reference,
            section: FilingSection::new("text").unwrap(),
            kinds: vec![revenue, cashflow, debt],
        });
        assert_eq!(summary.first_error().map(PipelineError::exit_code), Some(5));
        assert!(matches!(
            summary.outcome(AnalysisKind::Revenue),
            Some(KindOutcome::Cached { .. })
        ));
    }

    #[test]
    fn invalid_event_fails_the_kind() {
        let mut ks = KindState::new(AnalysisKind::Debt, PathBuf::from("out/debt.json"));
        ks.apply(Event::Written);
        assert_eq!(ks.stage, Stage::Failed);
        match ks.into_outcome() {
            KindOutcome::Failed { error } => {
                assert!(matches!(
                    error,
                    PipelineError::Transition {
                        kind: AnalysisKind::Debt,
                        ..
                    }
                ));
                assert!(error.to_string().contains("CheckCache"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
