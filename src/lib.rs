//! # Decision Debate
//!
//! A three-agent decision debate on top of a resilient structured-generation
//! client.
//!
//! An advocate argues **for** a decision, a second advocate argues
//! **against** it, and an arbiter weighs both sides on a fixed seven-row
//! rubric and returns a verdict. Every call goes to a remote,
//! schema-constrained generation service that may be overloaded, rate
//! limited or sloppy with its output; this crate is mostly about absorbing
//! that.
//!
//! ## Core Concepts
//!
//! - **[`GenerationClient`]** - one structured-generation request: schema
//!   sanitization, loose JSON parsing, strict validation, retry with
//!   exponential backoff and jitter, and fallback across models.
//! - **[`ExecCtx`]** - shared execution context (HTTP client, backend, base
//!   URL, retry policy, fallback models, cancellation, optional event
//!   handler).
//! - **[`DebatePipeline`]** - runs pro → con → judge in order and returns
//!   the completed [`PipelineState`].
//! - **[`stream_debate`]** - the same debate as a stream of
//!   [`DebateEvent`]s, each stage running on a [`WorkerPool`] slot.
//!
//! ## Quick Start
//!
//! ```no_run
//! use decision_debate::{DebatePipeline, DebateRequest, ExecCtx, Language};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = ExecCtx::gemini_from_env()?;
//!     let request = DebateRequest::new("Migrate billing to the new provider")
//!         .with_context("Contract renews in 6 weeks")
//!         .with_language(Language::En);
//!
//!     let state = DebatePipeline::new(&ctx).run(request).await?;
//!     let verdict = state.verdict.expect("completed debate has a verdict");
//!     let (pro, con) = verdict.weighted_totals();
//!     println!("{:?} ({pro:.2} vs {con:.2}): {}", verdict.decision, verdict.summary);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod output_parser;
pub mod pipeline;
pub mod pool;
pub mod prompt;
pub mod schema;
pub mod streaming;
pub mod types;

pub use backend::{Backend, GeminiBackend, GenerationReply, GenerationRequest, MockBackend, RetryPolicy};
pub use client::{GenerationClient, GenerationConfig, StructuredOutput};
pub use diagnostics::GenerationDiagnostics;
pub use error::{DebateError, ErrorClass, Result};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use pipeline::DebatePipeline;
pub use pool::WorkerPool;
pub use schema::{Argument, Criterion, DebatePosition, Decision, ScorecardRow, Validate, Verdict, Winner};
pub use streaming::{stream_debate, DebateEvent};
pub use types::{Agent, DebateRequest, Language, PipelinePhase, PipelineState, StageOutput};
