//! Progress reporting for task runs. The engine emits done/total in completion
//! order; the console layer consumes it through a sink.

use std::sync::Arc;

/// One progress update: how many executions are done and the total count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub done: usize,
    pub total: usize,
}

/// Sink for progress events. Implementations may throttle (e.g. every k runs).
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;
