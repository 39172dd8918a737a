use super::LlmClient;
use crate::config::ModelConfig;
use crate::errors::PipelineResult;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini `generateContent` with a JSON response mime type.
pub struct GeminiClient {
    pub model: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_retries: u32,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn from_config(cfg: &ModelConfig) -> PipelineResult<Self> {
        let api_key = cfg.require_api_key()?.to_string();
        Ok(Self {
            model: cfg.model.clone(),
            api_key,
            temperature: cfg.temperature,
            max_retries: cfg.max_retries,
            base_url: cfg
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: super::http_client(cfg.timeout_secs)?,
        })
    }

    fn request_body(&self, prompt: &str, system: Option<&[String]>) -> serde_json::Value {
        let mut generation_config = json!({ "responseMimeType": "application/json" });
        if let Some(t) = self.temperature {
            generation_config["temperature"] = json!(t);
        }

        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        });
        if let Some(sys) = super::system_text(system) {
            body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
        }
        body
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = self.request_body(prompt, system);

        let resp = crate::providers::http::send_with_retry(
            || {
                self.client
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&body)
            },
            "Gemini generateContent API",
            self.max_retries,
        )
        .await?;
        let json: serde_json::Value = resp.json().await?;

        let parts = json
            .pointer("/candidates/0/content/parts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                let reason = json
                    .pointer("/promptFeedback/blockReason")
                    .and_then(|v| v.as_str())
                    .unwrap_or("no candidates");
                anyhow::anyhow!("Gemini API response missing content ({})", reason)
            })?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(LlmResponse {
            text,
            provider: "gemini".to_string(),
            model: self.model.clone(),
            meta: json!({ "usage": json.get("usageMetadata").cloned().unwrap_or_default() }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiClient {
        let cfg = ModelConfig::judge_default()
            .with_api_key("g-test")
            .with_base_url(server.uri())
            .with_max_retries(0);
        GeminiClient::from_config(&cfg).unwrap()
    }

    #[tokio::test]
    async fn joins_candidate_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "g-test"))
            .and(body_partial_json(json!({
                "generationConfig": { "responseMimeType": "application/json", "temperature": 0.0 },
                "systemInstruction": { "parts": [{ "text": "judge" }] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "{\"passorfail\":" }, { "text": "\"pass\"}" }] }
                }]
            })))
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .complete("review this", Some(&["judge".to_string()]))
            .await
            .unwrap();
        assert_eq!(resp.text, "{\"passorfail\":\"pass\"}");
        assert_eq!(resp.model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn blocked_prompt_reports_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).complete("x", None).await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
