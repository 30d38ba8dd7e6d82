// Scripted reasoning provider for tests and offline runs

use crate::services::providers::{OutputSchema, ProviderError, ReasoningProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Deterministic stand-in for a model backend: returns a fixed value,
/// optionally fails every call, and records the prompts it was given.
pub struct MockProvider {
    name: &'static str,
    response: Value,
    should_fail: bool,
    call_count: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockProvider {
    pub fn new(name: &'static str, response: Value) -> Self {
        Self {
            name,
            response,
            should_fail: false,
            call_count: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            response: Value::Null,
            should_fail: true,
            call_count: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().expect("prompt lock poisoned").clone()
    }
}

#[async_trait]
impl ReasoningProvider for MockProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, prompt: &str, schema: &OutputSchema) -> Result<Value, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("prompt lock poisoned") = Some(prompt.to_string());

        if self.should_fail {
            return Err(ProviderError::ApiError {
                status: 503,
                message: format!("{} unavailable", self.name),
            });
        }

        schema
            .validate(&self.response)
            .map_err(ProviderError::SchemaViolation)?;
        Ok(self.response.clone())
    }
}
