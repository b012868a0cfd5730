//! Scripted generation provider for tests and offline development.

use crate::client::{GenerationClient, GenerationRequest, GenerationResponse, GenerationUsage};
use askdesk_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Behavior of the scripted client on each call.
#[derive(Debug, Clone)]
enum Script {
    /// Echo a fixed answer
    Answer(String),
    /// Fail every call with the given message
    Fail(String),
    /// Sleep for the given duration before answering, to exercise
    /// caller-side deadlines
    Delay(Duration, String),
}

/// Deterministic generation client for tests.
///
/// Mirrors the deterministic embedding provider: hermetic and
/// predictable, so orchestration behavior can be asserted without a
/// model runtime.
#[derive(Debug)]
pub struct ScriptedClient {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedClient {
    /// A client that always answers with `answer`.
    pub fn answering(answer: impl Into<String>) -> Self {
        Self {
            script: Script::Answer(answer.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A client that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A client that sleeps before answering.
    pub fn delayed(delay: Duration, answer: impl Into<String>) -> Self {
        Self {
            script: Script::Delay(delay, answer.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GenerationClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.script {
            Script::Answer(answer) => Ok(GenerationResponse {
                content: answer.clone(),
                model: request.model.clone(),
                usage: GenerationUsage::default(),
            }),
            Script::Fail(message) => Err(AppError::Generation(message.clone())),
            Script::Delay(delay, answer) => {
                tokio::time::sleep(*delay).await;
                Ok(GenerationResponse {
                    content: answer.clone(),
                    model: request.model.clone(),
                    usage: GenerationUsage::default(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_answer() {
        let client = ScriptedClient::answering("forty-two");
        let request = GenerationRequest::new("question", "test-model");

        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.content, "forty-two");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let client = ScriptedClient::failing("runtime offline");
        let request = GenerationRequest::new("question", "test-model");

        let err = client.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("runtime offline"));
    }

    #[tokio::test]
    async fn test_scripted_delay_exceeds_deadline() {
        let client = ScriptedClient::delayed(Duration::from_millis(200), "late");
        let request = GenerationRequest::new("question", "test-model");

        let result =
            tokio::time::timeout(Duration::from_millis(10), client.complete(&request)).await;
        assert!(result.is_err());
    }
}
