//! Shared request loop: status mapping and retry with jittered backoff.
//!
//! Only this module interprets transport failures and status codes; the
//! provider clients just build requests and parse bodies.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum CallError {
    /// Rate limit, server error, or transport failure.
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },
    Fatal(String),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Transient { message, .. } | CallError::Fatal(message) => {
                f.write_str(message)
            }
        }
    }
}

/// Send the request built by `build`, retrying transient failures up to
/// `max_retries` times. Returns the first 2xx response.
pub(crate) async fn send_with_retry<F>(
    build: F,
    target: &str,
    max_retries: u32,
) -> anyhow::Result<reqwest::Response>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut retries = 0;

    loop {
        match send_once(build(), target).await {
            Ok(response) => return Ok(response),
            Err(e @ CallError::Transient { .. }) if retries < max_retries => {
                retries += 1;
                let backoff = backoff_for(&e, retries);

                warn!(
                    target_url = target,
                    error = %e,
                    retry = retries,
                    max_retries = max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying request"
                );

                tokio::time::sleep(backoff).await;
            }
            Err(e) => anyhow::bail!("{}", e),
        }
    }
}

async fn send_once(
    request: reqwest::RequestBuilder,
    target: &str,
) -> Result<reqwest::Response, CallError> {
    let response = request.send().await.map_err(|e| CallError::Transient {
        message: format!("request to {} failed: {}", target, e),
        retry_after: None,
    })?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    let message = format!("{} returned HTTP {}: {}", target, status.as_u16(), body.trim());

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(CallError::Transient {
            message,
            retry_after,
        })
    } else {
        Err(CallError::Fatal(message))
    }
}

fn backoff_for(err: &CallError, retries: u32) -> Duration {
    use rand::Rng;

    match err {
        CallError::Transient {
            retry_after: Some(retry_after),
            ..
        } => {
            let capped = (*retry_after).min(MAX_BACKOFF);
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((capped.as_millis() as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        _ => {
            let base = Duration::from_secs(1 << retries.min(5)).min(MAX_BACKOFF);
            let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/flaky", server.uri());
        let response = send_with_retry(|| client.get(&url), "flaky", 1)
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/denied", server.uri());
        let err = send_with_retry(|| client.get(&url), "denied", 3)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("HTTP 401"));
        assert!(err.contains("bad key"));
    }

    #[test]
    fn retry_after_is_capped() {
        let err = CallError::Transient {
            message: "slow down".into(),
            retry_after: Some(Duration::from_secs(600)),
        };
        let backoff = backoff_for(&err, 1);
        assert!(backoff <= Duration::from_millis(33_000));
        assert!(backoff >= Duration::from_millis(27_000));
    }
}
