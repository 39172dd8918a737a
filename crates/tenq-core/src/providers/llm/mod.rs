pub mod gemini;
pub mod openai;
pub mod tracing;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ModelConfig, ProviderKind};
use crate::errors::PipelineResult;
use crate::model::LlmResponse;

pub use self::gemini::GeminiClient;
pub use self::openai::OpenAIClient;
pub use self::tracing::TracingLlmClient;

/// A generative model endpoint that answers with JSON text.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;

    fn model_id(&self) -> String {
        self.provider_name().to_string()
    }
}

/// Build the client for one configured endpoint, wrapped in request tracing.
pub fn build_client(cfg: &ModelConfig) -> PipelineResult<Arc<dyn LlmClient>> {
    let inner: Arc<dyn LlmClient> = match cfg.provider {
        ProviderKind::OpenAi => Arc::new(OpenAIClient::from_config(cfg)?),
        ProviderKind::Gemini => Arc::new(GeminiClient::from_config(cfg)?),
    };
    Ok(Arc::new(TracingLlmClient::new(inner)))
}

/// Joined system instructions, if any.
pub(crate) fn system_text(system: Option<&[String]>) -> Option<String> {
    system
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.join("\n\n"))
}

/// First JSON object or array in a model's output, skipping any prose before it.
pub(crate) fn first_json_value(text: &str) -> anyhow::Result<serde_json::Value> {
    let text = text.trim();
    let json_start_idx = text
        .find('{')
        .or_else(|| text.find('['))
        .ok_or_else(|| anyhow::anyhow!("No JSON start ({{ or [) found in model output"))?;
    let json_segment = &text[json_start_idx..];

    serde_json::Deserializer::from_str(json_segment)
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No JSON object found in extracted text"))?
        .map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))
}

pub(crate) fn http_client(timeout_secs: u64) -> PipelineResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| crate::errors::PipelineError::Config {
            message: format!("failed to create HTTP client: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_requires_credentials() {
        let err = build_client(&ModelConfig::judge_default()).err().unwrap();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn build_client_picks_provider() {
        let client = build_client(&ModelConfig::generator_default().with_api_key("k")).unwrap();
        assert_eq!(client.provider_name(), "openai");
        assert_eq!(client.model_id(), "gpt-5-mini");
    }

    #[test]
    fn first_json_value_skips_prose_and_trailing_text() {
        let value = first_json_value("Sure! ```json\n{\"a\": 1}\n``` done").unwrap();
        assert_eq!(value["a"], 1);
        assert!(first_json_value("no json here").is_err());
        assert!(first_json_value("{ \"a\": ").is_err());
    }

    #[test]
    fn system_text_joins_parts() {
        assert_eq!(system_text(None), None);
        assert_eq!(system_text(Some(&[])), None);
        let parts = vec!["a".to_string(), "b".to_string()];
        assert_eq!(system_text(Some(&parts)).as_deref(), Some("a\n\nb"));
    }
}
