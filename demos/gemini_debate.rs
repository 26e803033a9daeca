//! Example: a blocking debate against Gemini, saved as JSON.
//!
//! Run with:
//! `GEMINI_API_KEY=... cargo run --example gemini_debate -- "Hire a second designer" "Budget 80k" ru`

use decision_debate::{DebatePipeline, DebateRequest, ExecCtx, Language};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let decision = args.next().ok_or("usage: gemini_debate <decision> [context] [en|ru]")?;
    let context = args.next().unwrap_or_default();
    let language = match args.next().as_deref() {
        Some("ru") => Language::Ru,
        _ => Language::En,
    };

    let ctx = ExecCtx::gemini_from_env()?;
    let request = DebateRequest::new(decision)
        .with_context(context)
        .with_language(language);

    let state = DebatePipeline::new(&ctx).run(request).await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
