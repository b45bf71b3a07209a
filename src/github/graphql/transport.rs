//! Blocking HTTP transport for the GitHub GraphQL endpoint.

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use url::Url;

use super::{DEFAULT_ENDPOINT, GraphQlRequest, GraphQlTransport};
use crate::github::error::HarvestError;
use crate::github::locator::PersonalAccessToken;

const DEFAULT_RETRIES: u32 = 3;
const BACKOFF_FACTOR: Duration = Duration::from_millis(100);
const USER_AGENT: &str = concat!("review-harvest/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQlClientConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Resends allowed after a connection failure, a timeout, or a `429`,
    /// `500`, `502`, `503` or `504` response.
    pub retries: u32,
}

impl Default for GraphQlClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl GraphQlClientConfig {
    /// Constructs configuration for a specific endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, retries: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            retries,
        }
    }
}

/// `reqwest`-backed GraphQL transport authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    endpoint: Url,
    token: PersonalAccessToken,
    retries: u32,
}

impl ReqwestTransport {
    /// Builds the transport; the token is bound here, once, for every query.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when the endpoint is not a
    /// valid URL or the HTTP client cannot be configured.
    pub fn new(
        token: PersonalAccessToken,
        config: &GraphQlClientConfig,
    ) -> Result<Self, HarvestError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|error| HarvestError::Configuration {
                message: format!("GraphQL endpoint '{}' is invalid: {error}", config.endpoint),
            })?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| HarvestError::Configuration {
                message: format!("failed to configure GitHub HTTP client: {error}"),
            })?;

        Ok(Self {
            client,
            endpoint,
            token,
            retries: config.retries,
        })
    }

    /// Endpoint every request is posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send_with_retries(&self, request: &GraphQlRequest) -> Result<Response, HarvestError> {
        let mut attempt: u32 = 0;
        loop {
            let outcome = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(self.token.value())
                .json(request)
                .send();

            match outcome {
                Ok(response)
                    if is_retryable_status(response.status()) && attempt < self.retries =>
                {
                    attempt += 1;
                    tracing::debug!(
                        operation = request.operation_name.as_str(),
                        attempt,
                        status = response.status().as_u16(),
                        "retrying GraphQL request after server response"
                    );
                }
                Ok(response) => return Ok(response),
                Err(error) if is_transient(&error) && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(
                        operation = request.operation_name.as_str(),
                        attempt,
                        "retrying GraphQL request after transport failure: {error}"
                    );
                }
                Err(error) => {
                    return Err(HarvestError::Network {
                        message: format!("{} request failed: {error}", request.operation_name),
                    });
                }
            }
            thread::sleep(backoff_delay(attempt));
        }
    }
}

impl GraphQlTransport for ReqwestTransport {
    fn post(&self, request: &GraphQlRequest) -> Result<Value, HarvestError> {
        let response = self.send_with_retries(request)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().map_or_else(
                |_| "(failed to read error response body)".to_owned(),
                |content| truncate_for_message(content.as_str(), 160),
            );
            return Err(map_http_error(&request.operation_name, status, &body));
        }

        response
            .json::<Value>()
            .map_err(|error| HarvestError::UnexpectedResponse {
                message: format!("{} response is not JSON: {error}", request.operation_name),
            })
    }
}

const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

fn is_rate_limit_failure(status: StatusCode, body: &str) -> bool {
    matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && body.to_lowercase().contains("rate limit")
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

const fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Pause before resend number `attempt`: none for the first, then
/// `BACKOFF_FACTOR * 2^(attempt - 1)`.
const fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    if exponent == 0 {
        Duration::ZERO
    } else if exponent >= u32::BITS {
        Duration::MAX
    } else {
        BACKOFF_FACTOR.saturating_mul(1 << exponent)
    }
}

fn map_http_error(operation: &str, status: StatusCode, body: &str) -> HarvestError {
    if is_rate_limit_failure(status, body) {
        HarvestError::RateLimitExceeded {
            message: format!("{operation} failed: GitHub returned {status} {body}"),
        }
    } else if is_auth_failure(status) {
        HarvestError::Authentication {
            message: format!("{operation} failed: GitHub returned {status} {body}"),
        }
    } else {
        HarvestError::Api {
            message: format!("{operation} failed with status {status}: {body}"),
        }
    }
}

fn truncate_for_message(message: &str, max_chars: usize) -> String {
    let mut output = String::new();
    let mut chars = message.chars();

    for _ in 0..max_chars {
        let Some(character) = chars.next() else {
            return output;
        };
        output.push(character);
    }

    if chars.next().is_some() {
        output.push_str("...");
    }

    output
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
