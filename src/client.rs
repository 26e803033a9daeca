//! Resilient structured-generation client.
//!
//! [`GenerationClient`] issues one structured-generation request against the
//! backend in [`ExecCtx`], coerces the reply into a typed value, and absorbs
//! service flakiness: retryable failures are retried with exponential backoff
//! and jitter, and a model that runs out of tries hands over to the next
//! fallback model. Fatal failures surface immediately.

use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{candidate_models, GenerationReply, GenerationRequest};
use crate::diagnostics::GenerationDiagnostics;
use crate::error::{DebateError, ErrorClass, Result};
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::output_parser::{parse_loose_json, sanitize_schema};
use crate::schema::{response_schema, Validate};

/// Sampling parameters for a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature. Default: 0.2.
    pub temperature: f64,

    /// Maximum output tokens. Default: 1400.
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 1400,
        }
    }
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }
}

/// A validated value together with what it took to obtain it.
#[derive(Debug, Clone)]
pub struct StructuredOutput<T> {
    pub value: T,
    pub diagnostics: GenerationDiagnostics,
}

/// Issues structured-generation requests for one requested model.
///
/// # Example
///
/// ```no_run
/// use decision_debate::{ExecCtx, GenerationClient, GenerationConfig};
/// use decision_debate::schema::DebatePosition;
///
/// # async fn run() -> decision_debate::Result<()> {
/// let ctx = ExecCtx::gemini_from_env()?;
/// let position: DebatePosition = GenerationClient::new(&ctx, "gemini-3-flash-preview")
///     .generate_structured(
///         "You argue in favor of the decision.",
///         "Decision under consideration: Launch product X",
///         &GenerationConfig::default().with_max_output_tokens(2200),
///     )
///     .await?;
/// println!("{} arguments", position.arguments.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GenerationClient<'a> {
    ctx: &'a ExecCtx,
    model: String,
}

impl<'a> GenerationClient<'a> {
    /// Client that tries `model` first, then the context's fallback models.
    pub fn new(ctx: &'a ExecCtx, model: impl Into<String>) -> Self {
        Self {
            ctx,
            model: model.into(),
        }
    }

    /// Generate and validate a `T`.
    pub async fn generate_structured<T>(
        &self,
        system_instruction: &str,
        user_text: &str,
        config: &GenerationConfig,
    ) -> Result<T>
    where
        T: DeserializeOwned + JsonSchema + Validate,
    {
        self.generate_with_diagnostics(system_instruction, user_text, config)
            .await
            .map(|out| out.value)
    }

    /// Like [`generate_structured`](Self::generate_structured), also
    /// returning [`GenerationDiagnostics`].
    pub async fn generate_with_diagnostics<T>(
        &self,
        system_instruction: &str,
        user_text: &str,
        config: &GenerationConfig,
    ) -> Result<StructuredOutput<T>>
    where
        T: DeserializeOwned + JsonSchema + Validate,
    {
        let ctx = self.ctx;
        let schema = sanitize_schema(&response_schema::<T>()?);
        let models = candidate_models(&self.model, &ctx.fallback_models);
        if models.is_empty() {
            return Err(DebateError::InvalidConfig(
                "no model to call: requested model is blank and no fallbacks are set".into(),
            ));
        }

        let mut request = GenerationRequest {
            model: String::new(),
            system_instruction: system_instruction.to_string(),
            user_text: user_text.to_string(),
            response_schema: schema,
            config: config.clone(),
        };
        let mut diag = GenerationDiagnostics::default();
        let mut last_error: Option<DebateError> = None;
        let max_attempts = ctx.retry.max_attempts_per_model.max(1);

        for (idx, model) in models.iter().enumerate() {
            request.model = model.clone();
            diag.models_tried.push(model.clone());

            for attempt in 1..=max_attempts {
                ctx.check_cancelled()?;
                diag.attempts += 1;
                debug!(model = %model, attempt, backend = ctx.backend.name(), "generation attempt");

                let err = match self.attempt::<T>(&request).await {
                    Ok((value, kind)) => {
                        diag.model = Some(model.clone());
                        diag.reply_kind = Some(kind);
                        return Ok(StructuredOutput {
                            value,
                            diagnostics: diag,
                        });
                    }
                    Err(err) => err,
                };

                let class = err.class();
                emit(
                    &ctx.event_handler,
                    Event::AttemptFailed {
                        model: model.clone(),
                        attempt,
                        class,
                        reason: err.to_string(),
                    },
                );
                if class == ErrorClass::Fatal {
                    warn!(model = %model, attempt, error = %err, "fatal generation error");
                    return Err(err);
                }
                warn!(model = %model, attempt, ?class, error = %err, "retryable generation error");
                last_error = Some(err);

                if attempt < max_attempts {
                    let delay = ctx.retry.delay_for_attempt(attempt);
                    let delay_ms = delay.as_millis() as u64;
                    diag.backoff_total_ms += delay_ms;
                    emit(
                        &ctx.event_handler,
                        Event::Backoff {
                            model: model.clone(),
                            attempt,
                            delay_ms,
                        },
                    );
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            let next = models.get(idx + 1).cloned();
            info!(model = %model, next = ?next, "model exhausted");
            emit(
                &ctx.event_handler,
                Event::ModelExhausted {
                    model: model.clone(),
                    next,
                },
            );
        }

        match last_error {
            Some(err) if err.is_transient() => Err(DebateError::ServiceUnavailable {
                models: diag.models_tried,
                source: Box::new(err),
            }),
            Some(err) => Err(err),
            None => Err(DebateError::Other("generation made no attempts".into())),
        }
    }

    async fn attempt<T>(&self, request: &GenerationRequest) -> Result<(T, &'static str)>
    where
        T: DeserializeOwned + Validate,
    {
        let reply = self
            .ctx
            .backend
            .generate(&self.ctx.client, &self.ctx.base_url, request)
            .await?;
        let kind = match reply {
            GenerationReply::Parsed(_) => "parsed",
            GenerationReply::Text(_) => "text",
        };
        Ok((coerce_reply(reply)?, kind))
    }
}

/// Turn a backend reply into a validated `T`.
///
/// A pre-parsed value is used as is; text goes through
/// [`parse_loose_json`]. Shape mismatches are reported as
/// [`DebateError::Validation`] so the client retries them.
///
/// # Example
///
/// ```
/// use decision_debate::backend::GenerationReply;
/// use decision_debate::client::coerce_reply;
/// use decision_debate::DebateError;
/// use decision_debate::schema::DebatePosition;
///
/// let err = coerce_reply::<DebatePosition>(GenerationReply::Text("  ".into())).unwrap_err();
/// assert!(matches!(err, DebateError::EmptyReply));
/// ```
pub fn coerce_reply<T>(reply: GenerationReply) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value = match reply {
        GenerationReply::Parsed(value) => value,
        GenerationReply::Text(text) if text.trim().is_empty() => {
            return Err(DebateError::EmptyReply)
        }
        GenerationReply::Text(text) => Value::Object(parse_loose_json(&text)?),
    };
    let typed: T =
        serde_json::from_value(value).map_err(|e| DebateError::Validation(e.to_string()))?;
    typed.validate()?;
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockStep};
    use crate::backend::RetryPolicy;
    use crate::schema::DebatePosition;
    use serde_json::json;
    use std::sync::Arc;

    fn position_json() -> Value {
        json!({
            "arguments": [
                {"claim": "a", "reasoning": "r", "evidence": "e", "risk": "k", "confidence": 0.7},
                {"claim": "b", "reasoning": "r", "evidence": "assumption: demand holds", "risk": "k", "confidence": 0.5},
                {"claim": "c", "reasoning": "r", "evidence": "e", "risk": "k", "confidence": 0.9}
            ]
        })
    }

    fn ctx_with(mock: Arc<MockBackend>) -> ExecCtx {
        ExecCtx::builder("http://unused")
            .backend(mock)
            .retry_policy(RetryPolicy::immediate())
            .build()
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.temperature, 0.2);
        assert_eq!(cfg.max_output_tokens, 1400);
        let cfg = cfg.with_temperature(0.0).with_max_output_tokens(2800);
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.max_output_tokens, 2800);
    }

    #[test]
    fn test_coerce_parsed_reply() {
        let pos: DebatePosition = coerce_reply(GenerationReply::Parsed(position_json())).unwrap();
        assert_eq!(pos.arguments.len(), 3);
        assert!(pos.arguments[1].is_assumption());
    }

    #[test]
    fn test_coerce_fenced_text_reply() {
        let text = format!("```json\n{}\n```", position_json());
        let pos: DebatePosition = coerce_reply(GenerationReply::Text(text)).unwrap();
        assert_eq!(pos.arguments[0].claim, "a");
    }

    #[test]
    fn test_coerce_shape_mismatch_is_validation() {
        let err = coerce_reply::<DebatePosition>(GenerationReply::Parsed(json!({"args": []})))
            .unwrap_err();
        assert!(matches!(err, DebateError::Validation(_)));
        assert_eq!(err.class(), ErrorClass::RetryableOutput);
    }

    #[test]
    fn test_coerce_garbage_is_parse_error() {
        let err = coerce_reply::<DebatePosition>(GenerationReply::Text("no json".into()))
            .unwrap_err();
        assert!(matches!(err, DebateError::Parse(_)));
    }

    #[tokio::test]
    async fn test_sends_sanitized_schema_and_config() {
        let mock = Arc::new(MockBackend::new(vec![MockStep::parsed(position_json())]));
        let ctx = ctx_with(mock.clone());
        let cfg = GenerationConfig::default().with_max_output_tokens(2200);
        let _: DebatePosition = GenerationClient::new(&ctx, "m1")
            .generate_structured("sys", "user", &cfg)
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "m1");
        assert_eq!(req.system_instruction, "sys");
        assert_eq!(req.config.max_output_tokens, 2200);
        let schema = req.response_schema.to_string();
        assert!(!schema.contains("additionalProperties"));
        assert!(!schema.contains("$schema"));
        assert!(schema.contains("arguments"));
    }

    #[tokio::test]
    async fn test_invalid_output_is_retried_on_same_model() {
        let mock = Arc::new(MockBackend::new(vec![
            MockStep::text("not json at all"),
            MockStep::parsed(json!({"arguments": []})),
            MockStep::parsed(position_json()),
        ]));
        let ctx = ctx_with(mock.clone());
        let out = GenerationClient::new(&ctx, "m1")
            .generate_with_diagnostics::<DebatePosition>("s", "u", &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(mock.models_called(), vec!["m1", "m1", "m1"]);
        assert_eq!(out.diagnostics.attempts, 3);
        assert_eq!(out.diagnostics.reply_kind, Some("parsed"));
        assert!(!out.diagnostics.fell_back());
    }

    #[tokio::test]
    async fn test_output_errors_exhausted_reraise_last_error() {
        let mock = Arc::new(MockBackend::fixed("still not json"));
        let ctx = ExecCtx::builder("http://unused")
            .backend(mock.clone())
            .retry_policy(RetryPolicy::immediate())
            .fallback_models(["f1"])
            .build()
            .unwrap();
        let err = GenerationClient::new(&ctx, "m1")
            .generate_structured::<DebatePosition>("s", "u", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::Parse(_)));
        assert_eq!(mock.call_count(), 6);
    }

    #[tokio::test]
    async fn test_consistency_error_is_not_retried() {
        use crate::schema::Verdict;
        let verdict = json!({
            "decision": "go",
            "winner": "pro",
            "confidence": 0.8,
            "summary": "s",
            "scorecard": crate::schema::Criterion::ALL.iter().map(|c| json!({
                "criterion": c.label(), "weight": c.weight(),
                "pro_score": 7, "con_score": 4, "rationale": "r"
            })).collect::<Vec<_>>(),
            "key_risks": ["a", "b"],
            "assumptions_to_verify": ["x"],
            "next_48h_actions": ["p", "q"],
            "needs_more_info": true,
            "clarifying_questions": []
        });
        let mock = Arc::new(MockBackend::new(vec![MockStep::parsed(verdict)]));
        let ctx = ctx_with(mock.clone());
        let err = GenerationClient::new(&ctx, "m1")
            .generate_structured::<Verdict>("s", "u", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::Consistency(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_model_without_fallbacks_is_invalid_config() {
        let mock = Arc::new(MockBackend::fixed("{}"));
        let ctx = ExecCtx::builder("http://unused")
            .backend(mock.clone())
            .fallback_models(Vec::<String>::new())
            .build()
            .unwrap();
        let err = GenerationClient::new(&ctx, "  ")
            .generate_structured::<DebatePosition>("s", "u", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::InvalidConfig(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        use std::sync::atomic::AtomicBool;
        let mock = Arc::new(MockBackend::fixed("{}"));
        let ctx = ExecCtx::builder("http://unused")
            .backend(mock.clone())
            .cancellation(Some(Arc::new(AtomicBool::new(true))))
            .build()
            .unwrap();
        let err = GenerationClient::new(&ctx, "m1")
            .generate_structured::<DebatePosition>("s", "u", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::Cancelled));
        assert_eq!(mock.call_count(), 0);
    }
}
