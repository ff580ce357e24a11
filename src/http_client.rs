use std::time::Duration;

use reqwest::{header, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{Error, Result};

/// The shared transport behind every client operation.
///
/// Wraps a single `reqwest::Client` and re-sends requests that come back with
/// one of the retry policy's statuses.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    inner: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for this client");
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: builder.build()?,
            retry: config.retry.clone(),
        })
    }

    /// Starts a request against the underlying client.
    pub fn request(&self, method: reqwest::Method, url: url::Url) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Sends the request, retrying on the policy's statuses.
    ///
    /// Any non-success status left after the last attempt becomes [`Error::Api`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let mut attempt = 0;
        loop {
            // The built request is kept pristine so every attempt sends the same bytes.
            tracing::debug!("{} {} (attempt {})", method, url, attempt + 1);
            let response = self
                .inner
                .execute(clone_request(&request)?)
                .await
                .map_err(|e| {
                    tracing::error!("{} {} failed: {}", method, url, e);
                    Error::Http(e)
                })?;

            let status = response.status();
            tracing::debug!("{} {} returned {}", method, url, status);

            // Only a handful of statuses are worth another go, and only a couple of times.
            let retryable = self.retry.should_retry_status(status.as_u16());
            if retryable && attempt < self.retry.max_retries() {
                let delay = self
                    .retry
                    .delay_for_attempt(attempt, retry_after(&response));
                tracing::warn!(
                    "{} {} returned {}, retrying in {:?} ({} of {})",
                    method,
                    url,
                    status,
                    delay,
                    attempt + 1,
                    self.retry.max_retries()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            // Out of retries, or never eligible. Anything but success is the caller's problem,
            // and the body usually says why.
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                tracing::error!("{} {} failed: HTTP {} - {}", method, url, status, message);
                return Err(Error::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }
    }

    /// Sends the request and decodes a JSON body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::error!("Failed to parse JSON response: {}", e);
            Error::Decode(format!("{} - Body: {}", e, String::from_utf8_lossy(&body)))
        })
    }
}

fn clone_request(request: &Request) -> Result<Request> {
    request
        .try_clone()
        .ok_or_else(|| Error::Config("request body cannot be replayed".to_string()))
}

/// Reads a `Retry-After` header given in whole seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
