//! Backend trait and normalized request/reply types.
//!
//! The [`Backend`] trait abstracts over structured-generation providers,
//! translating a normalized [`GenerationRequest`] into the provider's HTTP
//! API and its answer into a [`GenerationReply`]. Built-in implementations:
//! [`GeminiBackend`] and, for tests, [`MockBackend`].
//!
//! ## Architecture
//!
//! ```text
//! GenerationClient ──► GenerationRequest ──► Backend::generate() ──► GenerationReply
//!        │                                          │                 Parsed(Value) | Text(String)
//!   retry / fallback                     ┌──────────┴──────────┐
//!   (RetryPolicy)                   GeminiBackend          MockBackend
//!                                   :generateContent       scripted replies
//! ```

pub mod backoff;
pub mod gemini;
pub mod mock;

pub use backoff::{candidate_models, RetryPolicy, DEFAULT_FALLBACK_MODELS};
pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use crate::client::GenerationConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// A normalized structured-generation request, provider-agnostic.
///
/// [`GenerationClient`](crate::client::GenerationClient) builds one per
/// attempt; only `model` changes between attempts.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    pub model: String,

    /// System instruction describing the role.
    pub system_instruction: String,

    /// The user turn.
    pub user_text: String,

    /// Sanitized JSON schema the reply must follow.
    pub response_schema: Value,

    /// Sampling parameters.
    pub config: GenerationConfig,
}

/// What a backend hands back on success.
///
/// Provider errors travel as `Err`, so together with [`Result`] this is the
/// closed set {pre-parsed object, raw text, provider error}.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationReply {
    /// The provider already decoded the structured output.
    Parsed(Value),
    /// Raw reply text expected to contain JSON.
    Text(String),
}

/// Abstraction over structured-generation providers.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn Backend>`.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute one structured-generation call. No retries.
    async fn generate(
        &self,
        client: &Client,
        base_url: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationReply>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &'static str;
}
