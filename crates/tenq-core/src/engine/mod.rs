mod controller;
pub mod state;

pub use controller::{IterationSink, PipelineController};
pub use state::{IterationOutcome, KindOutcome, RunSummary};
