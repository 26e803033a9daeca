//! The three-stage debate: advocate-for, advocate-against, arbiter.
//!
//! Stages run strictly in order, each threading its validated output into
//! [`PipelineState`]. The first error halts the debate; no later stage runs
//! and no partial verdict is produced. Retries and model fallback happen
//! inside [`GenerationClient`]; nothing here retries.

use tracing::{info, info_span, warn, Instrument};

use crate::client::{GenerationClient, GenerationConfig};
use crate::error::Result;
use crate::events::{emit, Event};
use crate::exec_ctx::ExecCtx;
use crate::prompt;
use crate::schema::{DebatePosition, Verdict};
use crate::types::{Agent, DebateRequest, PipelineState, StageOutput};

/// Output budget for each advocate.
pub const ADVOCATE_MAX_OUTPUT_TOKENS: u32 = 2200;

/// Output budget for the arbiter.
pub const ARBITER_MAX_OUTPUT_TOKENS: u32 = 2800;

/// Run the advocate arguing for the decision.
pub async fn run_advocate_for(ctx: &ExecCtx, state: &PipelineState) -> Result<DebatePosition> {
    run_advocate(ctx, Agent::Pro, state).await
}

/// Run the advocate arguing against the decision.
///
/// Independent of the advocate-for output.
pub async fn run_advocate_against(ctx: &ExecCtx, state: &PipelineState) -> Result<DebatePosition> {
    run_advocate(ctx, Agent::Con, state).await
}

async fn run_advocate(ctx: &ExecCtx, agent: Agent, state: &PipelineState) -> Result<DebatePosition> {
    GenerationClient::new(ctx, state.model.clone())
        .generate_structured(
            &prompt::system_instruction(agent, state.language),
            &prompt::user_prompt(&state.decision, &state.context, state.language),
            &GenerationConfig::default().with_max_output_tokens(ADVOCATE_MAX_OUTPUT_TOKENS),
        )
        .await
}

/// Run the arbiter over both argument lists in `state`.
pub async fn run_arbiter(ctx: &ExecCtx, state: &PipelineState) -> Result<Verdict> {
    let user = prompt::arbiter_prompt(
        &state.decision,
        &state.context,
        &state.pro_arguments,
        &state.con_arguments,
        state.language,
    )?;
    GenerationClient::new(ctx, state.model.clone())
        .generate_structured(
            &prompt::system_instruction(Agent::Judge, state.language),
            &user,
            &GenerationConfig::default().with_max_output_tokens(ARBITER_MAX_OUTPUT_TOKENS),
        )
        .await
}

/// Run one role against `state` without modifying it.
pub async fn run_stage(ctx: &ExecCtx, agent: Agent, state: &PipelineState) -> Result<StageOutput> {
    let output = match agent {
        Agent::Pro => StageOutput::Pro(run_advocate_for(ctx, state).await?.arguments),
        Agent::Con => StageOutput::Con(run_advocate_against(ctx, state).await?.arguments),
        Agent::Judge => StageOutput::Judge(run_arbiter(ctx, state).await?),
    };
    Ok(output)
}

/// Blocking form of the debate: runs all three stages and returns the
/// completed state.
///
/// # Example
///
/// ```no_run
/// use decision_debate::{DebatePipeline, DebateRequest, ExecCtx};
///
/// # async fn run() -> decision_debate::Result<()> {
/// let ctx = ExecCtx::gemini_from_env()?;
/// let state = DebatePipeline::new(&ctx)
///     .run(DebateRequest::new("Launch product X").with_context("budget 50k"))
///     .await?;
/// if let Some(verdict) = state.verdict {
///     println!("{:?}: {}", verdict.decision, verdict.summary);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DebatePipeline<'a> {
    ctx: &'a ExecCtx,
}

impl<'a> DebatePipeline<'a> {
    pub fn new(ctx: &'a ExecCtx) -> Self {
        Self { ctx }
    }

    /// Run pro, con and judge in order.
    pub async fn run(&self, request: DebateRequest) -> Result<PipelineState> {
        request.validate()?;
        let mut state = PipelineState::new(&request);

        while let Some(agent) = state.phase.next_agent() {
            let span = info_span!("stage", %agent, model = %state.model);
            let output = run_observed(self.ctx, agent, &state).instrument(span).await?;
            state.apply(output)?;
        }
        Ok(state)
    }
}

/// [`run_stage`] wrapped in stage events and logging.
pub(crate) async fn run_observed(
    ctx: &ExecCtx,
    agent: Agent,
    state: &PipelineState,
) -> Result<StageOutput> {
    emit(&ctx.event_handler, Event::StageStart { agent });
    info!(%agent, "stage started");
    let result = run_stage(ctx, agent, state).await;
    emit(
        &ctx.event_handler,
        Event::StageEnd {
            agent,
            ok: result.is_ok(),
        },
    );
    match &result {
        Ok(_) => info!(%agent, "stage completed"),
        Err(e) => warn!(%agent, error = %e, "stage failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockStep};
    use crate::backend::RetryPolicy;
    use crate::error::DebateError;
    use crate::events::FnEventHandler;
    use crate::types::{Language, PipelinePhase};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn position(tag: &str) -> Value {
        let args: Vec<Value> = (0..3)
            .map(|i| {
                json!({"claim": format!("{tag}{i}"), "reasoning": "r", "evidence": "e",
                       "risk": "k", "confidence": 0.6})
            })
            .collect();
        json!({ "arguments": args })
    }

    fn verdict() -> Value {
        json!({
            "decision": "conditional_go",
            "winner": "pro",
            "confidence": 0.7,
            "summary": "Close call.",
            "scorecard": crate::schema::Criterion::ALL.iter().map(|c| json!({
                "criterion": c.label(), "weight": c.weight(),
                "pro_score": 6, "con_score": 5, "rationale": "r"
            })).collect::<Vec<_>>(),
            "key_risks": ["a", "b"],
            "assumptions_to_verify": ["x"],
            "next_48h_actions": ["p", "q"],
            "needs_more_info": false
        })
    }

    fn ctx(mock: Arc<MockBackend>) -> ExecCtx {
        ExecCtx::builder("http://unused")
            .backend(mock)
            .retry_policy(RetryPolicy::immediate())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_run_threads_state() {
        let mock = Arc::new(MockBackend::new(vec![
            MockStep::parsed(position("pro")),
            MockStep::parsed(position("con")),
            MockStep::parsed(verdict()),
        ]));
        let ctx = ctx(mock.clone());
        let state = DebatePipeline::new(&ctx)
            .run(DebateRequest::new("Launch product X").with_model("m1"))
            .await
            .unwrap();

        assert_eq!(state.phase, PipelinePhase::JudgeCompleted);
        assert_eq!(state.pro_arguments[0].claim, "pro0");
        assert_eq!(state.con_arguments[2].claim, "con2");
        assert!(state.verdict.is_some());

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].config.max_output_tokens, ADVOCATE_MAX_OUTPUT_TOKENS);
        assert_eq!(requests[1].config.max_output_tokens, ADVOCATE_MAX_OUTPUT_TOKENS);
        assert_eq!(requests[2].config.max_output_tokens, ARBITER_MAX_OUTPUT_TOKENS);
        assert_eq!(requests[0].user_text, requests[1].user_text);
        assert!(requests[2].user_text.contains("pro0"));
        assert!(requests[2].user_text.contains("con0"));
        assert!(requests.iter().all(|r| r.model == "m1"));
    }

    #[tokio::test]
    async fn test_stage_failure_halts_pipeline() {
        let mock = Arc::new(MockBackend::new(vec![
            MockStep::parsed(position("pro")),
            MockStep::fail("HTTP 400: API key not valid"),
        ]));
        let ctx = ctx(mock.clone());
        let err = DebatePipeline::new(&ctx)
            .run(DebateRequest::new("d"))
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::Provider { .. }));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_decision_makes_no_calls() {
        let mock = Arc::new(MockBackend::fixed("{}"));
        let ctx = ctx(mock.clone());
        let err = DebatePipeline::new(&ctx)
            .run(DebateRequest::new(" "))
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::InvalidConfig(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_russian_prompts_and_stage_events() {
        let mock = Arc::new(MockBackend::new(vec![
            MockStep::parsed(position("pro")),
            MockStep::parsed(position("con")),
            MockStep::parsed(verdict()),
        ]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let ctx = ExecCtx::builder("http://unused")
            .backend(mock.clone())
            .retry_policy(RetryPolicy::immediate())
            .event_handler(Arc::new(FnEventHandler(move |e: Event| {
                if let Event::StageStart { agent } = e {
                    sink.lock().unwrap().push(agent);
                }
            })))
            .build()
            .unwrap();
        DebatePipeline::new(&ctx)
            .run(DebateRequest::new("Нанять").with_language(Language::Ru))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), Agent::ALL.to_vec());
        let requests = mock.requests();
        assert!(requests[0].user_text.starts_with("Решение для анализа"));
        assert!(requests[2].user_text.contains("Аргументы ПРОТИВ"));
        assert!(requests[2].system_instruction.contains("in Russian"));
    }
}
