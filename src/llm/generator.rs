use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};

/// Sampling parameters for a generation call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sampling {
    /// Temperature (0-1, lower = more deterministic); `None` leaves the provider default
    pub temperature: Option<f64>,
    /// Maximum tokens in the response; `None` uses the client default
    pub max_tokens: Option<u32>,
}

impl Sampling {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: None,
        }
    }
}

/// A single "instructions in, text out" call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub sampling: Sampling,
    /// Ask the provider for object-shaped output when it supports it
    pub structured: bool,
}

/// Text generation capability used by the writer and the judge
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> PipelineResult<String>;
}

/// Deterministic generator replaying queued responses in order
///
/// Every request is recorded, which makes it possible to assert how many
/// calls a stage issued and what it sent.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<PipelineResult<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for response in responses {
            generator.push(response);
        }
        generator
    }

    pub fn push(&self, response: impl Into<String>) {
        self.lock_responses().push_back(Ok(response.into()));
    }

    pub fn push_error(&self, error: PipelineError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<PipelineResult<String>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> PipelineResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.lock_responses().pop_front().unwrap_or_else(|| {
            Err(PipelineError::Transport(
                "scripted generator has no response left".to_string(),
            ))
        })
    }
}
