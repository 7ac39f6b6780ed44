use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text produced by one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Model completion, or a description of the failure when `is_error` is set
    pub text: String,
    /// Set when the call failed after retries or could not be attempted
    pub is_error: bool,
    /// Transport attempts consumed (0 when the call never reached the network)
    pub attempts: u32,
    /// Wall-clock duration including backoff
    #[serde(with = "secs_f64")]
    pub duration: Duration,
}

impl RawResponse {
    pub fn success(text: String, attempts: u32, duration: Duration) -> Self {
        Self {
            text,
            is_error: false,
            attempts,
            duration,
        }
    }

    pub fn error(message: String, attempts: u32, duration: Duration) -> Self {
        Self {
            text: message,
            is_error: true,
            attempts,
            duration,
        }
    }
}

mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or_default())
    }
}
