//! Outbound HTTP shared by the provider adapters.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::resilience::{call_with_retry, CircuitBreaker, ResilienceConfig, RetryPolicy};

/// Fixed timeout for every upstream request.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Replace every occurrence of `secret` in `text` with `***`.
pub(crate) fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "***")
    }
}

/// HTTP client for one upstream, guarded by its own breaker.
pub(crate) struct UpstreamClient {
    provider: &'static str,
    client: Client,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub(crate) fn new(provider: &'static str, resilience: &ResilienceConfig) -> Self {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            provider,
            client,
            breaker: CircuitBreaker::with_config(provider, resilience.breaker.clone()),
            retry: resilience.retry.clone(),
        }
    }

    pub(crate) fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// GET `url` and return the body text.
    ///
    /// `secret` is scrubbed from everything that gets logged.
    pub(crate) async fn get_text(
        &self,
        url: &Url,
        headers: &[(&'static str, &str)],
        secret: &str,
    ) -> Result<String, MarketDataError> {
        self.get_screened(url, headers, secret, |_| Ok(())).await
    }

    /// Like [`get_text`](Self::get_text), but `screen` inspects each 2xx body
    /// inside the retried attempt.
    ///
    /// An error from `screen` is handled like a failed request: it counts
    /// against the breaker and is retried when its class allows it. Use it for
    /// upstreams that report throttling inside a 200 response.
    pub(crate) async fn get_screened<S>(
        &self,
        url: &Url,
        headers: &[(&'static str, &str)],
        secret: &str,
        screen: S,
    ) -> Result<String, MarketDataError>
    where
        S: Fn(&str) -> Result<(), MarketDataError>,
    {
        let redacted = redact(url.as_str(), secret);
        debug!(provider = self.provider, url = %redacted, "Upstream request");

        let screen = &screen;
        let result: Result<String, MarketDataError> = call_with_retry(&self.breaker, &self.retry, || async move {
            let body = self.send_once(url, headers).await?;
            screen(&body)?;
            Ok(body)
        })
        .await;

        match &result {
            Ok(body) => debug!(
                provider = self.provider,
                url = %redacted,
                bytes = body.len(),
                "Upstream request succeeded"
            ),
            Err(e) => warn!(
                provider = self.provider,
                url = %redacted,
                error = %redact(&e.to_string(), secret),
                "Upstream request failed"
            ),
        }

        result
    }

    async fn send_once(
        &self,
        url: &Url,
        headers: &[(&'static str, &str)],
    ) -> Result<String, MarketDataError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: self.provider.to_string(),
                }
            } else {
                MarketDataError::ProviderError {
                    provider: self.provider.to_string(),
                    message: format!("Request failed: {}", e.without_url()),
                }
            }
        })?;

        let status = response.status();

        // Quota exhaustion shows up as 403 on some plans
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(MarketDataError::RateLimited {
                provider: self.provider.to_string(),
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::Unauthorized {
                provider: self.provider.to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("Failed to read response: {}", e.without_url()),
            })
    }
}
