//! Evaluation-run orchestration core.
//!
//! A [`TaskDeclaration`](model::TaskDeclaration) names a function under test,
//! a list of eval cases, an optional parameter matrix and scorer bindings.
//! [`plan_task`](engine::plan_task) expands it into plan entries without running
//! anything; [`run_task`](engine::run_task) executes every entry (times
//! `runs_per_eval`) under a bounded worker pool and returns one
//! [`RunRecord`](model::RunRecord) per execution, in plan order.
//!
//! ```no_run
//! use std::sync::Arc;
//! use evalrun_core::engine::{run_task, RunOptions};
//! use evalrun_core::model::{EvalCase, TaskDeclaration};
//! use evalrun_core::task::SyncTask;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let task = SyncTask::new(|_id, input, _params, _fields| Ok(input.clone()));
//! let decl = TaskDeclaration::new("echo", Arc::new(task))
//!     .with_scorer("string_exact_match")
//!     .with_eval(EvalCase::new("hi".into(), "hi".into()));
//!
//! let result = run_task(&decl, &RunOptions::default()).await?;
//! assert_eq!(result.runs.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod interpolate;
pub mod model;
pub mod report;
pub mod scorers;
pub mod task;

pub use engine::{plan_task, run_task, RunOptions, RunTaskResult};
pub use errors::EvalError;
