//! Mock backend for testing without a live generation service.
//!
//! [`MockBackend`] plays back a script of replies and failures in order and
//! records every request it receives, so retry, fallback and pipeline
//! behavior can be asserted deterministically.
//!
//! # Example
//!
//! ```
//! use decision_debate::backend::mock::{MockBackend, MockStep};
//!
//! let mock = MockBackend::new(vec![
//!     MockStep::fail("HTTP 503: UNAVAILABLE"),
//!     MockStep::text(r#"{"ok": true}"#),
//! ]);
//! assert_eq!(mock.call_count(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{Backend, GenerationReply, GenerationRequest};
use crate::error::{DebateError, Result};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Succeed with this reply.
    Reply(GenerationReply),
    /// Fail with a provider error carrying this message.
    Fail(String),
}

impl MockStep {
    /// Raw text reply.
    pub fn text(text: impl Into<String>) -> Self {
        MockStep::Reply(GenerationReply::Text(text.into()))
    }

    /// Pre-parsed structured reply.
    pub fn parsed(value: Value) -> Self {
        MockStep::Reply(GenerationReply::Parsed(value))
    }

    /// Provider failure; classified by its message like a real one.
    pub fn fail(message: impl Into<String>) -> Self {
        MockStep::Fail(message.into())
    }
}

/// A test backend that plays back scripted steps in order.
///
/// Cycles back to the beginning when all steps have been consumed.
#[derive(Debug)]
pub struct MockBackend {
    steps: Vec<MockStep>,
    index: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockBackend {
    /// Create a mock backend with the given script.
    pub fn new(steps: Vec<MockStep>) -> Self {
        assert!(!steps.is_empty(), "MockBackend requires at least one step");
        Self {
            steps,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(vec![MockStep::text(text)])
    }

    /// Create a mock that always fails with the same provider message.
    pub fn fixed_failure(message: impl Into<String>) -> Self {
        Self::new(vec![MockStep::fail(message)])
    }

    /// Number of `generate` calls received so far.
    pub fn call_count(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }

    /// Model id of every call received so far, in order.
    pub fn models_called(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    /// Copy of every request received so far, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn next_step(&self) -> MockStep {
        let idx = self.index.fetch_add(1, Ordering::SeqCst) % self.steps.len();
        self.steps[idx].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn generate(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationReply> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        match self.next_step() {
            MockStep::Reply(reply) => Ok(reply),
            MockStep::Fail(message) => Err(DebateError::provider(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
