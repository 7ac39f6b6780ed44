//! HTTP client for an OpenAI-compatible chat completions endpoint.
//!
//! Transient failures (network, 429, 5xx) are retried with linear backoff.
//! Everything else ends the call at once. No failure escapes as `Err`: the
//! [`Generator`] impl folds it into an error-flagged [`RawResponse`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{ClientConfig, ClientError, GenerationRequest, Generator, RawResponse};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'static str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Completion client backed by the Groq chat completions API
pub struct CompletionClient {
    http: Client,
    api_key: Option<String>,
    config: ClientConfig,
}

impl CompletionClient {
    /// Environment variable holding the API credential
    pub const API_KEY_VAR: &'static str = "GROQ_API_KEY";

    pub fn new(api_key: Option<String>, config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            config,
        })
    }

    /// Build a client with the credential taken from [`Self::API_KEY_VAR`]
    pub fn from_env(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(std::env::var(Self::API_KEY_VAR).ok(), config)
    }

    /// Execute a single request attempt
    async fn execute_request(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest<'_>,
    ) -> Result<String, ClientError> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Network(format!("request timed out: {}", e))
                } else if e.is_connect() {
                    ClientError::Network(format!("connection failed: {}", e))
                } else {
                    ClientError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => ClientError::RateLimited(body),
                code if status.is_server_error() => ClientError::Server { status: code, body },
                code => ClientError::Rejected { status: code, body },
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        if let Some(usage) = &data.usage {
            debug!(total_tokens = usage.total_tokens, "Completion usage");
        }

        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ClientError::Decode("no choices returned".to_string()))
    }
}

#[async_trait]
impl Generator for CompletionClient {
    fn name(&self) -> &str {
        "Groq"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> RawResponse {
        let start = Instant::now();

        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Completion requested without a credential");
            return RawResponse::error(
                format!("ERROR: {}", ClientError::MissingCredential),
                0,
                start.elapsed(),
            );
        };

        let user_content = request.user_content();
        let body = ChatCompletionRequest {
            model: request.model.as_str(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let max_attempts = self.config.max_attempts.max(1);
        debug!(
            model = %request.model,
            instruction_len = request.instruction.len(),
            source_len = request.source_text.len(),
            "Sending completion request"
        );

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.execute_request(api_key, &body).await {
                Ok(text) => {
                    info!(attempt, chars = text.len(), "Completion received");
                    return RawResponse::success(text, attempt, start.elapsed());
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Transient completion error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt, error = %e, "Completion retries exhausted");
                    return RawResponse::error(
                        format!(
                            "ERROR: Failed to communicate with the completion service after {} attempts. Last error: {}",
                            attempt, e
                        ),
                        attempt,
                        start.elapsed(),
                    );
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Completion request failed");
                    return RawResponse::error(format!("ERROR: {}", e), attempt, start.elapsed());
                }
            }
        }
    }
}
