//! Retry policy: attempts per model, exponential backoff with jitter, and
//! the ordered model fallback list.
//!
//! [`RetryPolicy`] controls how many times the generation client retries a
//! retryable failure on one model and how long it sleeps in between.
//! [`candidate_models`] builds the ordered, de-duplicated list of models
//! to walk through once a model is exhausted.

use std::time::Duration;

/// Models tried, in order, after the requested one.
pub const DEFAULT_FALLBACK_MODELS: [&str; 2] = ["gemini-2.5-flash", "gemini-2.5-flash-lite"];

/// Retry and backoff configuration for the generation client.
///
/// The delay before try `n + 1` (after `n` failed tries on the same model) is
/// `base_delay * multiplier^(n-1) + jitter`, with jitter drawn uniformly
/// from `[0, max_jitter)`.
///
/// # Example
///
/// ```
/// use decision_debate::backend::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::standard();
/// assert_eq!(policy.max_attempts_per_model, 3);
/// assert_eq!(policy.base_delay, Duration::from_millis(800));
///
/// // Tests and batch jobs that must not sleep:
/// let fast = RetryPolicy::immediate();
/// assert_eq!(fast.delay_for_attempt(2), Duration::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Tries per candidate model, including the first. Default: 3.
    pub max_attempts_per_model: u32,

    /// Delay after the first failed try. Default: 800 ms.
    pub base_delay: Duration,

    /// Multiplier applied per further failure. Default: 2.0.
    pub multiplier: f64,

    /// Upper bound (exclusive) of the uniform jitter added to each delay.
    /// Default: 350 ms.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    /// 3 tries per model, 0.8 s base delay doubling each time, up to 0.35 s jitter.
    pub fn standard() -> Self {
        Self {
            max_attempts_per_model: 3,
            base_delay: Duration::from_millis(800),
            multiplier: 2.0,
            max_jitter: Duration::from_millis(350),
        }
    }

    /// Same attempt budget as [`standard`](Self::standard), without sleeping.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
            ..Self::standard()
        }
    }

    /// Set the number of tries per model (at least 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts_per_model = attempts.max(1);
        self
    }

    /// Delay to wait after failed try number `attempt` (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let base = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let jitter = fastrand::f64() * self.max_jitter.as_secs_f64();
        Duration::from_secs_f64(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// The requested model first, then each fallback, skipping blanks and
/// models already listed.
///
/// ```
/// use decision_debate::backend::candidate_models;
///
/// let models = candidate_models("gemini-2.5-flash", &["gemini-2.5-flash".into(), "lite".into()]);
/// assert_eq!(models, vec!["gemini-2.5-flash", "lite"]);
/// ```
pub fn candidate_models(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut models: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
    for model in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
        let model = model.trim();
        if !model.is_empty() && !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }
    models
}
