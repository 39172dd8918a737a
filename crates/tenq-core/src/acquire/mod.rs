//! Filing acquisition: picks the filing for one pipeline iteration.
//!
//! The only contract with the rest of the pipeline is [`FilingSource::acquire`]:
//! either an [`AcquiredFiling`] with a non-empty Item 2 section, or an error.

mod interactive;

pub use interactive::InteractiveSource;

use async_trait::async_trait;

use crate::errors::PipelineResult;
use crate::model::AcquiredFiling;

/// Line-based operator prompts. Implementations return
/// [`PipelineError::Operator`](crate::errors::PipelineError::Operator) when
/// input is closed.
pub trait Operator: Send {
    /// Free-text answer.
    fn input(&mut self, prompt: &str) -> PipelineResult<String>;

    /// Yes/no answer.
    fn confirm(&mut self, prompt: &str) -> PipelineResult<bool>;

    /// Choose one of `items`. `None` means "none of these, fetch live instead".
    fn select(&mut self, prompt: &str, items: &[String]) -> PipelineResult<Option<usize>>;

    /// Informational message.
    fn show(&mut self, message: &str);
}

/// Produces the filing for the next iteration.
#[async_trait]
pub trait FilingSource: Send {
    async fn acquire(&mut self) -> PipelineResult<AcquiredFiling>;
}
