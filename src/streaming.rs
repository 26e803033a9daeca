//! Streaming form of the debate.
//!
//! [`stream_debate`] runs the same three stages as
//! [`DebatePipeline`](crate::pipeline::DebatePipeline), each on a
//! [`WorkerPool`] slot, and reports progress as a stream of [`DebateEvent`]s:
//!
//! ```text
//! progress(pro) → result(pro) → progress(con) → result(con)
//!   → progress(judge) → result(judge) → done
//! ```
//!
//! The first failure ends the stream with a single `error` event. Dropping
//! the stream stops the debate before its next stage; a call already in
//! flight finishes on its own but its result is discarded.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info_span, warn, Instrument};

use crate::exec_ctx::ExecCtx;
use crate::pipeline::run_observed;
use crate::pool::WorkerPool;
use crate::types::{Agent, DebateRequest, PipelineState, StageOutput};

/// Buffered events between the driver task and the consumer.
const CHANNEL_CAPACITY: usize = 8;

/// One item of a streamed debate.
#[derive(Debug, Clone, PartialEq)]
pub enum DebateEvent {
    /// A stage started.
    Progress { agent: Agent },
    /// A stage finished with a validated payload.
    Result { agent: Agent, data: StageOutput },
    /// All three stages finished.
    Done,
    /// The debate failed; nothing follows.
    Error { message: String },
}

impl DebateEvent {
    /// Event name on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            DebateEvent::Progress { .. } => "progress",
            DebateEvent::Result { .. } => "result",
            DebateEvent::Done => "done",
            DebateEvent::Error { .. } => "error",
        }
    }

    /// Event payload on the wire.
    pub fn data(&self) -> Value {
        match self {
            DebateEvent::Progress { agent } => json!({"agent": agent, "status": "thinking"}),
            DebateEvent::Result { agent, data } => match data.to_value() {
                Ok(value) => json!({"agent": agent, "data": value}),
                Err(e) => json!({"agent": agent, "error": e.to_string()}),
            },
            DebateEvent::Done => json!({}),
            DebateEvent::Error { message } => json!({"message": message}),
        }
    }

    /// Whether the stream ends after this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DebateEvent::Done | DebateEvent::Error { .. })
    }

    /// Render as a server-sent-events frame.
    ///
    /// # Example
    ///
    /// ```
    /// use decision_debate::DebateEvent;
    ///
    /// assert_eq!(DebateEvent::Done.to_sse_frame(), "event: done\ndata: {}\n\n");
    /// ```
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event_name(), self.data())
    }
}

/// Run a debate on `pool`, streaming its events.
///
/// Invalid requests yield a single `error` event. The returned stream ends
/// after `done` or `error`.
///
/// # Example
///
/// ```no_run
/// use decision_debate::{stream_debate, DebateRequest, ExecCtx, WorkerPool};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # async fn run() -> decision_debate::Result<()> {
/// let pool = Arc::new(WorkerPool::default());
/// let ctx = Arc::new(ExecCtx::gemini_from_env()?);
/// let mut events = stream_debate(pool, ctx, DebateRequest::new("Launch product X"));
/// while let Some(event) = events.next().await {
///     print!("{}", event.to_sse_frame());
/// }
/// # Ok(())
/// # }
/// ```
pub fn stream_debate(
    pool: Arc<WorkerPool>,
    ctx: Arc<ExecCtx>,
    request: DebateRequest,
) -> BoxStream<'static, DebateEvent> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let span = info_span!("debate_stream", model = %request.model, language = %request.language);
    tokio::spawn(drive(pool, ctx, request, tx).instrument(span));

    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .boxed()
}

async fn drive(
    pool: Arc<WorkerPool>,
    ctx: Arc<ExecCtx>,
    request: DebateRequest,
    tx: mpsc::Sender<DebateEvent>,
) {
    if let Err(e) = request.validate() {
        let _ = tx.send(DebateEvent::Error { message: e.to_string() }).await;
        return;
    }
    let mut state = PipelineState::new(&request);

    while let Some(agent) = state.phase.next_agent() {
        if tx.is_closed() {
            debug!(%agent, "consumer gone; stopping before stage");
            return;
        }
        if tx.send(DebateEvent::Progress { agent }).await.is_err() {
            return;
        }

        let stage_ctx = ctx.clone();
        let snapshot = state.clone();
        let outcome = pool
            .run(async move { run_observed(&stage_ctx, agent, &snapshot).await })
            .await
            .and_then(|output| {
                state.apply(output.clone())?;
                Ok(output)
            });

        let event = match outcome {
            Ok(data) => DebateEvent::Result { agent, data },
            Err(e) => {
                warn!(%agent, error = %e, "debate stream failed");
                let _ = tx.send(DebateEvent::Error { message: e.to_string() }).await;
                return;
            }
        };
        if tx.send(event).await.is_err() {
            return;
        }
    }

    let _ = tx.send(DebateEvent::Done).await;
}
