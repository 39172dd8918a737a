use crate::model::LlmResponse;
use crate::providers::llm::LlmClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info_span, Instrument};

/// Runs every request of the inner client inside an `llm.request` span.
pub struct TracingLlmClient {
    inner: Arc<dyn LlmClient>,
}

impl TracingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for TracingLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let span = info_span!(
            "llm.request",
            provider = self.inner.provider_name(),
            model = %self.inner.model_id(),
            prompt_chars = prompt.len(),
            elapsed_ms = tracing::field::Empty,
            error = tracing::field::Empty
        );

        let started = Instant::now();
        let result = self
            .inner
            .complete(prompt, system)
            .instrument(span.clone())
            .await;

        span.record("elapsed_ms", started.elapsed().as_millis() as u64);
        match &result {
            Ok(resp) => {
                tracing::debug!(parent: &span, response_chars = resp.text.len(), "model responded");
            }
            Err(e) => {
                span.record("error", tracing::field::display(e));
                tracing::warn!(parent: &span, error = %e, "model request failed");
            }
        }
        result
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model_id(&self) -> String {
        self.inner.model_id()
    }
}
