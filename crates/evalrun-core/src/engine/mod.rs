//! Planning and execution entry points.

mod execute;
pub(crate) mod plan;
pub mod pool;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::errors::EvalError;
use crate::model::{RunRecord, TaskDeclaration, TaskPlan};
use crate::report::progress::{ProgressEvent, ProgressSink};
use execute::{execute_plan, ExecutionJob};
use plan::build_plan_entries;
use pool::run_with_concurrency;

#[derive(Clone)]
pub struct RunOptions {
    /// Independent attempts per plan entry. Zero is treated as one.
    pub runs_per_eval: u32,
    /// Bound on in-flight executions across all entries and attempts. Zero is treated as one.
    pub max_concurrency: usize,
    pub verbose: bool,
    /// Called after each execution completes, in completion order.
    pub progress: Option<ProgressSink>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            runs_per_eval: 1,
            max_concurrency: 1,
            verbose: false,
            progress: None,
        }
    }
}

impl RunOptions {
    pub fn with_runs_per_eval(mut self, runs: u32) -> Self {
        self.runs_per_eval = runs;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("runs_per_eval", &self.runs_per_eval)
            .field("max_concurrency", &self.max_concurrency)
            .field("verbose", &self.verbose)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTaskResult {
    pub runs: Vec<RunRecord>,
}

/// Expand a declaration without executing anything.
pub fn plan_task(task: &TaskDeclaration) -> Result<Vec<TaskPlan>, EvalError> {
    Ok(build_plan_entries(task)?
        .into_iter()
        .map(|entry| entry.plan)
        .collect())
}

/// Plan, then execute every (entry, attempt) pair under the concurrency bound.
///
/// Only configuration errors are returned; per-execution failures are recorded
/// on the corresponding run record. Records are ordered by entry, then attempt.
pub async fn run_task(
    task: &TaskDeclaration,
    options: &RunOptions,
) -> Result<RunTaskResult, EvalError> {
    let runs_per_eval = options.runs_per_eval.max(1);
    let max_concurrency = options.max_concurrency.max(1);
    let verbose = options.verbose;

    let entries = build_plan_entries(task)?;
    let jobs: Vec<ExecutionJob<'_>> = entries
        .iter()
        .flat_map(|entry| (1..=runs_per_eval).map(move |attempt| ExecutionJob { entry, attempt }))
        .collect();

    let total = jobs.len();
    if verbose {
        tracing::info!(
            task = %task.name,
            entries = entries.len(),
            executions = total,
            max_concurrency,
            "running task"
        );
    } else {
        tracing::debug!(
            task = %task.name,
            entries = entries.len(),
            executions = total,
            max_concurrency,
            "running task"
        );
    }

    let done = AtomicUsize::new(0);
    let done = &done;
    let progress = options.progress.as_ref();

    let runs = run_with_concurrency(&jobs, max_concurrency, move |job, _| async move {
        let record = execute_plan(task, job, verbose).await;
        let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(sink) = progress {
            sink(ProgressEvent {
                done: finished,
                total,
            });
        }
        record
    })
    .await;

    Ok(RunTaskResult { runs })
}
