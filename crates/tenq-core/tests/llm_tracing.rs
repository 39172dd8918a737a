//! Span contract of `TracingLlmClient`: one `llm.request` span per call with
//! provider, model and timing; the prompt text itself is never logged.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tenq_core::model::LlmResponse;
use tenq_core::providers::llm::{LlmClient, TracingLlmClient};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;

struct StaticClient {
    fail: bool,
}

#[async_trait]
impl LlmClient for StaticClient {
    async fn complete(
        &self,
        _prompt: &str,
        _system: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        if self.fail {
            anyhow::bail!("HTTP 429: quota exhausted");
        }
        Ok(LlmResponse {
            text: "{\"passorfail\": \"pass\"}".to_string(),
            provider: "static".to_string(),
            model: "static-1".to_string(),
            meta: serde_json::Value::Null,
        })
    }

    fn provider_name(&self) -> &'static str {
        "static"
    }

    fn model_id(&self) -> String {
        "static-1".to_string()
    }
}

#[derive(Clone)]
struct MockWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl std::io::Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for MockWriter {
    type Writer = MockWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn setup_capture() -> (MockWriter, tracing::subscriber::DefaultGuard) {
    let writer = MockWriter {
        buf: Arc::new(Mutex::new(Vec::new())),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .finish();

    (writer, tracing::subscriber::set_default(subscriber))
}

/// Fields of the last closed `llm.request` span.
fn closed_span(output: &str) -> serde_json::Value {
    output
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line.trim()).ok())
        .find_map(|v| {
            v.get("span")
                .filter(|s| s["name"] == "llm.request")
                .cloned()
        })
        .expect("llm.request span closed")
}

#[tokio::test]
async fn span_records_provider_model_and_timing() {
    let (writer, _guard) = setup_capture();
    let client = TracingLlmClient::new(Arc::new(StaticClient { fail: false }));

    let resp = client
        .complete("ACME confidential MD&A text", None)
        .await
        .unwrap();
    assert_eq!(resp.model, "static-1");

    let output = String::from_utf8(writer.buf.lock().unwrap().clone()).unwrap();
    let span = closed_span(&output);
    assert_eq!(span["provider"], "static");
    assert_eq!(span["model"], "static-1");
    assert_eq!(span["prompt_chars"], 27);
    assert!(span.get("elapsed_ms").is_some());
    assert!(span.get("error").is_none());
    assert!(!output.contains("ACME confidential"));
}

#[tokio::test]
async fn failed_call_records_error_on_span() {
    let (writer, _guard) = setup_capture();
    let client = TracingLlmClient::new(Arc::new(StaticClient { fail: true }));

    let err = client.complete("prompt", None).await.unwrap_err();
    assert!(err.to_string().contains("quota exhausted"));

    let output = String::from_utf8(writer.buf.lock().unwrap().clone()).unwrap();
    let span = closed_span(&output);
    assert!(span["error"]
        .as_str()
        .is_some_and(|e| e.contains("HTTP 429")));
    assert!(output.contains("model request failed"));
}
