//! Example: streaming a debate as server-sent-event frames.
//!
//! Uses Gemini when `GEMINI_API_KEY` or `GOOGLE_API_KEY` is set.
//!
//! Run with: `cargo run --example stream_debate -- "Adopt a four-day work week"`

use decision_debate::{stream_debate, DebateRequest, ExecCtx, WorkerPool};
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let decision = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Adopt a four-day work week".to_string());

    let pool = Arc::new(WorkerPool::default());
    let ctx = Arc::new(ExecCtx::gemini_from_env()?);

    let mut events = stream_debate(pool.clone(), ctx, DebateRequest::new(decision));
    while let Some(event) = events.next().await {
        print!("{}", event.to_sse_frame());
    }

    pool.drain().await;
    Ok(())
}
