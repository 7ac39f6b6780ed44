#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use devoptima_agent::{GenerationRequest, Generator, RawResponse};
use devoptima_logging::{LogFormat, Logger};

/// Generator that replays canned responses and records every request.
///
/// Once the script runs dry it keeps returning the last response.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<RawResponse>>,
    last: Mutex<Option<RawResponse>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<RawResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| ok(t)).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> RawResponse {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| failure("ERROR: script exhausted")),
        }
    }
}

pub fn ok(text: &str) -> RawResponse {
    RawResponse::success(text.to_string(), 1, Duration::from_millis(5))
}

pub fn failure(text: &str) -> RawResponse {
    RawResponse::error(text.to_string(), 3, Duration::from_millis(5))
}

pub fn logger() -> Arc<Logger> {
    Arc::new(Logger::new(LogFormat::Compact))
}

pub const VALID_RESPONSE: &str =
    "---DESCRIPTION---\nAdded type hints.\n---CODE---\n```python\ndef add(a: int, b: int) -> int:\n    return a + b\n```";

pub const INVALID_RESPONSE: &str =
    "---DESCRIPTION---\nRefactored.\n---CODE---\n```python\ndef add(a, b:\n    return a + b\n```";
