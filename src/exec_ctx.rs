//! Execution context shared by every generation call of a debate.
//!
//! [`ExecCtx`] carries the HTTP client, the generation backend, the base URL,
//! the retry policy, the fallback model list, an optional cancellation flag
//! and an optional event handler. Construct it once at service start and
//! share it (`Arc<ExecCtx>`) across debates.

use crate::backend::gemini::{GeminiBackend, DEFAULT_BASE_URL};
use crate::backend::{Backend, RetryPolicy, DEFAULT_FALLBACK_MODELS};
use crate::error::Result;
use crate::events::EventHandler;
use crate::DebateError;
use reqwest::Client;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

/// Environment variable that overrides the Gemini base URL in
/// [`ExecCtx::gemini_from_env`].
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

/// Shared execution context for generation calls.
///
/// # Example
///
/// ```
/// use decision_debate::{ExecCtx, MockBackend, RetryPolicy};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder("http://unused")
///     .backend(Arc::new(MockBackend::fixed("{}")))
///     .retry_policy(RetryPolicy::immediate())
///     .fallback_models(["backup-model"])
///     .build()
///     .unwrap();
/// assert_eq!(ctx.fallback_models, vec!["backup-model"]);
/// ```
pub struct ExecCtx {
    /// HTTP client (cheap to clone -- uses `Arc` internally).
    pub client: Client,
    /// Base URL for the provider (e.g. `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    /// Generation backend.
    pub backend: Arc<dyn Backend>,
    /// Retry and backoff policy. Default: [`RetryPolicy::standard()`].
    pub retry: RetryPolicy,
    /// Models tried after the requested one. Default: [`DEFAULT_FALLBACK_MODELS`].
    pub fallback_models: Vec<String>,
    /// Optional cancellation flag; checked before every attempt.
    pub cancellation: Option<Arc<AtomicBool>>,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client: None,
            base_url: base_url.into(),
            backend: None,
            retry: None,
            fallback_models: None,
            cancellation: None,
            event_handler: None,
            timeout: None,
        }
    }

    /// Context for the Gemini API with defaults, reading the API key from the
    /// environment (see [`GeminiBackend::from_env`]) and the base URL from
    /// `GEMINI_BASE_URL` when set.
    pub fn gemini_from_env() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::builder(base_url)
            .backend(Arc::new(GeminiBackend::from_env()?))
            .build()
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Return an error if cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(DebateError::Cancelled);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("base_url", &self.base_url)
            .field("backend", &self.backend.name())
            .field("retry", &self.retry)
            .field("fallback_models", &self.fallback_models)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Option<Client>,
    base_url: String,
    backend: Option<Arc<dyn Backend>>,
    retry: Option<RetryPolicy>,
    fallback_models: Option<Vec<String>>,
    cancellation: Option<Arc<AtomicBool>>,
    event_handler: Option<Arc<dyn EventHandler>>,
    timeout: Option<Duration>,
}

impl ExecCtxBuilder {
    /// Set the HTTP client. If not set, a default client is created.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the generation backend. Required.
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the retry policy. Default: [`RetryPolicy::standard()`].
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Replace the fallback model list. Pass an empty list to disable fallback.
    pub fn fallback_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Set the cancellation flag.
    pub fn cancellation(mut self, cancel: Option<Arc<AtomicBool>>) -> Self {
        self.cancellation = cancel;
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Set the request timeout. Default: 120 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> Result<ExecCtx> {
        let backend = self.backend.ok_or_else(|| {
            DebateError::InvalidConfig("ExecCtx requires a generation backend".to_string())
        })?;
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(Duration::from_secs(120)))
                .build()?,
        };
        Ok(ExecCtx {
            client,
            base_url: normalize_base_url(&self.base_url),
            backend,
            retry: self.retry.unwrap_or_default(),
            fallback_models: self.fallback_models.unwrap_or_else(|| {
                DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect()
            }),
            cancellation: self.cancellation,
            event_handler: self.event_handler,
        })
    }
}

/// Strip known API version suffixes from a base URL so the backend can
/// append its own path.
/// e.g., "https://generativelanguage.googleapis.com/v1beta/" -> "https://generativelanguage.googleapis.com"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    for suffix in &["/v1beta/models", "/v1/models", "/v1beta", "/v1"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
