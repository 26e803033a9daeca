//! Example: a full debate against MockBackend, with one simulated overload.
//!
//! Run with: `RUST_LOG=decision_debate=debug cargo run --example mock_debate`

use decision_debate::backend::mock::MockStep;
use decision_debate::events::{Event, FnEventHandler};
use decision_debate::{Criterion, DebatePipeline, DebateRequest, ExecCtx, MockBackend, RetryPolicy};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn position(side: &str) -> serde_json::Value {
    json!({
        "arguments": (1..=3).map(|i| json!({
            "claim": format!("{side} argument {i}"),
            "reasoning": "Illustrative reasoning.",
            "evidence": "assumption: no data yet",
            "risk": "May not generalize.",
            "confidence": 0.6
        })).collect::<Vec<_>>()
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let verdict = json!({
        "decision": "conditional_go",
        "winner": "pro",
        "confidence": 0.64,
        "summary": "Worth doing if the pilot confirms demand.",
        "scorecard": Criterion::ALL.iter().map(|c| json!({
            "criterion": c.label(), "weight": c.weight(),
            "pro_score": 7, "con_score": 5, "rationale": "Mock scoring."
        })).collect::<Vec<_>>(),
        "key_risks": ["Demand is unproven", "Support load"],
        "assumptions_to_verify": ["Customers will pay"],
        "next_48h_actions": ["Interview five customers", "Price a pilot"],
        "needs_more_info": false
    });

    // The first pro call hits a simulated overload and is retried.
    let mock = MockBackend::new(vec![
        MockStep::fail("HTTP 503: UNAVAILABLE"),
        MockStep::parsed(position("pro")),
        MockStep::text(format!("```json\n{}\n```", position("con"))),
        MockStep::parsed(verdict),
    ]);

    let ctx = ExecCtx::builder("http://unused")
        .backend(Arc::new(mock))
        .retry_policy(RetryPolicy::immediate())
        .event_handler(Arc::new(FnEventHandler(|event: Event| match event {
            Event::StageStart { agent } => println!("[{agent}] thinking..."),
            Event::AttemptFailed { model, attempt, reason, .. } => {
                println!("  attempt {attempt} on {model} failed: {reason}")
            }
            _ => {}
        })))
        .build()?;

    let state = DebatePipeline::new(&ctx)
        .run(DebateRequest::new("Launch product X").with_model("mock-model"))
        .await?;

    println!("PRO: {} arguments, CON: {} arguments", state.pro_arguments.len(), state.con_arguments.len());
    if let Some(verdict) = &state.verdict {
        let (pro, con) = verdict.weighted_totals();
        println!("Decision: {:?} (weighted {pro:.2} vs {con:.2})", verdict.decision);
        println!("{}", verdict.summary);
    }
    Ok(())
}
