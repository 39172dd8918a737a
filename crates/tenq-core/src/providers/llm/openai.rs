use super::LlmClient;
use crate::config::ModelConfig;
use crate::errors::PipelineResult;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completions in JSON mode.
pub struct OpenAIClient {
    pub model: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub max_retries: u32,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
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
        let mut messages = Vec::new();
        if let Some(sys) = super::system_text(system) {
            messages.push(json!({ "role": "system", "content": sys }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "response_format": { "type": "json_object" },
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(prompt, system);

        let resp = crate::providers::http::send_with_retry(
            || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&body)
            },
            "OpenAI chat API",
            self.max_retries,
        )
        .await?;
        let json: serde_json::Value = resp.json().await?;

        // Parse choices[0].message.content
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: self.model.clone(),
            meta: json!({ "usage": json.get("usage").cloned().unwrap_or_default() }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
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

    fn client_for(server: &MockServer) -> OpenAIClient {
        let cfg = ModelConfig::generator_default()
            .with_api_key("sk-test")
            .with_base_url(server.uri())
            .with_max_retries(0);
        OpenAIClient::from_config(&cfg).unwrap()
    }

    #[tokio::test]
    async fn sends_json_mode_request_and_reads_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-5-mini",
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": "be strict" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "{\"ok\":true}" } }],
                "usage": { "total_tokens": 12 }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let resp = client
            .complete("hello", Some(&["be strict".to_string()]))
            .await
            .unwrap();
        assert_eq!(resp.text, "{\"ok\":true}");
        assert_eq!(resp.provider, "openai");
        assert_eq!(resp.meta["usage"]["total_tokens"], 12);
    }

    #[test]
    fn temperature_is_omitted_when_unset() {
        let client =
            OpenAIClient::from_config(&ModelConfig::generator_default().with_api_key("k")).unwrap();
        let body = client.request_body("p", None);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("hello", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing content"));
    }
}
