use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::RawResponse;

/// Errors that can occur while talking to the completion service
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unsupported model: {0} (supported: {supported})", supported = SupportedModel::names())]
    UnsupportedModel(String),

    #[error("GROQ_API_KEY not found")]
    MissingCredential,

    #[error("Client configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to decode completion: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether another attempt may succeed without intervention
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Network(_) | ClientError::RateLimited(_) | ClientError::Server { .. }
        )
    }
}

/// Models the completion service is allowed to be called with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SupportedModel {
    #[default]
    Llama33Versatile,
    Llama31Instant,
}

impl SupportedModel {
    pub const ALL: [SupportedModel; 2] = [
        SupportedModel::Llama33Versatile,
        SupportedModel::Llama31Instant,
    ];

    /// Identifier sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedModel::Llama33Versatile => "llama-3.3-70b-versatile",
            SupportedModel::Llama31Instant => "llama-3.1-8b-instant",
        }
    }

    fn names() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SupportedModel {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::UnsupportedModel(s.to_string()))
    }
}

/// One generation call: system instruction plus the source text it applies to
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub instruction: String,
    pub source_text: String,
    pub model: SupportedModel,
}

impl GenerationRequest {
    pub fn new(
        instruction: impl Into<String>,
        source_text: impl Into<String>,
        model: SupportedModel,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            source_text: source_text.into(),
            model,
        }
    }

    /// User message content: the source wrapped in a language-tagged block
    pub fn user_content(&self) -> String {
        format!("USER_CODE:\n```python\n{}\n```", self.source_text)
    }
}

/// Configuration for the completion client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat completions endpoint
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Total attempts per generation (first try included)
    pub max_attempts: u32,
    /// Backoff after failed attempt `n` is `retry_base_delay * n`
    pub retry_base_delay: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(2),
            temperature: 0.1,
            max_tokens: 4096,
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_API_URL: &'static str = "https://api.groq.com/openai/v1/chat/completions";

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Linear backoff: the delay grows with the number of failed attempts so far
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        self.retry_base_delay * failed_attempt
    }
}

/// The core abstraction over a text-completion backend.
///
/// Implementations never fail across this boundary: every transport or
/// service failure is folded into an error-flagged [`RawResponse`].
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Whether credentials are present; checked once at startup
    fn is_configured(&self) -> bool {
        true
    }

    /// Run one generation, retrying transient failures internally
    async fn generate(&self, request: &GenerationRequest) -> RawResponse;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_allow_list() {
        let model: SupportedModel = "llama-3.1-8b-instant".parse().unwrap();
        assert_eq!(model, SupportedModel::Llama31Instant);

        let err = "gpt-4".parse::<SupportedModel>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedModel(_)));
        assert!(err.to_string().contains("llama-3.3-70b-versatile"));
    }

    #[test]
    fn test_backoff_is_linear() {
        let config = ClientConfig::default().with_retry_base_delay(Duration::from_millis(100));
        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Network("reset".into()).is_transient());
        assert!(ClientError::Server {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ClientError::MissingCredential.is_transient());
        assert!(!ClientError::Rejected {
            status: 400,
            body: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_user_content_wraps_source() {
        let request = GenerationRequest::new("do it", "x = 1", SupportedModel::default());
        assert_eq!(request.user_content(), "USER_CODE:\n```python\nx = 1\n```");
    }
}
