//! Event hooks for generation and pipeline lifecycle.
//!
//! Provides an optional, non-intrusive way to observe a debate while it
//! runs: stages starting and finishing, failed attempts, backoff sleeps and
//! model fallbacks. Implement [`EventHandler`] to receive them for progress
//! tracking or metrics. Logging goes through `tracing` independently.

use std::sync::Arc;

use crate::error::ErrorClass;
use crate::types::Agent;

/// Events emitted while a debate runs.
#[derive(Debug, Clone)]
pub enum Event {
    /// A pipeline stage has started.
    StageStart {
        /// The role about to run.
        agent: Agent,
    },
    /// A pipeline stage has finished.
    StageEnd {
        /// The role that ran.
        agent: Agent,
        /// Whether the stage produced a validated result.
        ok: bool,
    },
    /// One generation attempt failed.
    AttemptFailed {
        /// Model the attempt was sent to.
        model: String,
        /// Attempt number on this model (1-indexed).
        attempt: u32,
        /// How the failure was classified.
        class: ErrorClass,
        /// Error description.
        reason: String,
    },
    /// The client is about to sleep before retrying the same model.
    Backoff {
        /// Model that will be retried.
        model: String,
        /// Attempt number that just failed (1-indexed).
        attempt: u32,
        /// Delay before the next attempt in milliseconds.
        delay_ms: u64,
    },
    /// A model used up its attempts.
    ModelExhausted {
        /// The exhausted model.
        model: String,
        /// The model tried next, if any remain.
        next: Option<String>,
    },
}

/// Handler for debate lifecycle events.
///
/// This is entirely optional -- the client and pipeline work without one.
///
/// # Example
///
/// ```
/// use decision_debate::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { agent } => println!("[start] {}", agent),
///             Event::ModelExhausted { model, next } => println!("{} exhausted, next {:?}", model, next),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when an event is emitted.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use decision_debate::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::Backoff { delay_ms, .. } = event {
///         eprintln!("backing off {delay_ms}ms");
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
