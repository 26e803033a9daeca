//! Diagnostics for a single structured-generation call.
//!
//! [`GenerationDiagnostics`] records what the retry loop went through before
//! it produced a value: which models were tried, how many calls were made,
//! how long was spent backing off, and what shape the winning reply had.

/// Records what happened inside one
/// [`GenerationClient`](crate::client::GenerationClient) call.
///
/// # Example
///
/// ```
/// use decision_debate::diagnostics::GenerationDiagnostics;
///
/// let diag = GenerationDiagnostics::default();
/// assert!(!diag.fell_back());
/// assert_eq!(diag.retries(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationDiagnostics {
    /// Model that produced the accepted reply.
    pub model: Option<String>,

    /// Every model attempted, in order (the requested one first).
    pub models_tried: Vec<String>,

    /// Total remote calls made, across all models.
    pub attempts: u32,

    /// Total time spent in backoff delays (milliseconds).
    pub backoff_total_ms: u64,

    /// Shape of the accepted reply: `"parsed"` or `"text"`.
    pub reply_kind: Option<&'static str>,
}

impl GenerationDiagnostics {
    /// Whether a fallback model had to be used.
    pub fn fell_back(&self) -> bool {
        self.models_tried.len() > 1
    }

    /// Calls beyond the first.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}
