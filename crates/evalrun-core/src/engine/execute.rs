use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use super::plan::PlanEntry;
use crate::model::{CapturedError, RunRecord, RunStatus, ScoreResult, TaskDeclaration};
use crate::scorers::{EvalContext, ResolvedScorer, ScoreContext, TaskIdentity};
use crate::task::RunFieldSetter;

/// One attempt of one plan entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecutionJob<'a> {
    pub entry: &'a PlanEntry<'a>,
    pub attempt: u32,
}

fn new_run_id() -> String {
    format!("run_{}", Uuid::new_v4())
}

/// Execute one attempt and always produce a record. Task and scorer failures
/// are captured on the record; nothing is propagated.
pub(crate) async fn execute_plan(
    task: &TaskDeclaration,
    job: &ExecutionJob<'_>,
    verbose: bool,
) -> RunRecord {
    let ExecutionJob { entry, attempt } = *job;
    let plan = &entry.plan;
    let run_id = new_run_id();
    let label = plan.eval_name.as_deref().unwrap_or(&plan.eval_id);
    let started_at = Utc::now();
    let started = Instant::now();
    let run_fields = RunFieldSetter::new();

    if verbose {
        info!(task = %task.name, eval = %label, attempt, "starting run");
    } else {
        debug!(task = %task.name, eval = %label, attempt, run_id = %run_id, "starting run");
    }

    let mut output = None;
    let mut score = None;
    let mut error = None;

    match task
        .task
        .run(&plan.eval_id, &plan.input, &plan.params, &run_fields)
        .await
    {
        Ok(value) => {
            if let (Some(scorer), Some(name)) = (&entry.scorer, plan.scorer.as_deref()) {
                match score_output(task, entry, attempt, &run_id, scorer, name, &value).await {
                    Ok(result) => score = Some(result),
                    Err(e) => error = Some(e),
                }
            }
            output = Some(value);
        }
        Err(e) => error = Some(e),
    }

    let finished_at = Utc::now();
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = if error.is_some() {
        RunStatus::Error
    } else {
        RunStatus::Success
    };

    match (&error, &score) {
        (Some(e), _) => {
            if verbose {
                info!(task = %task.name, eval = %plan.eval_id, attempt, error = %e, "run failed");
            } else {
                debug!(task = %task.name, eval = %plan.eval_id, attempt, error = %e, "run failed");
            }
        }
        (None, Some(s)) => {
            if verbose {
                info!(task = %task.name, eval = %plan.eval_id, attempt, score = s.score, "run scored");
            } else {
                debug!(task = %task.name, eval = %plan.eval_id, attempt, score = s.score, "run scored");
            }
        }
        (None, None) => debug!(task = %task.name, eval = %plan.eval_id, attempt, "run finished"),
    }

    RunRecord {
        id: run_id,
        status,
        task_name: task.name.clone(),
        task_description: task.description.clone(),
        eval_id: plan.eval_id.clone(),
        eval_name: plan.eval_name.clone(),
        attempt,
        params: plan.params.clone(),
        input: plan.input.clone(),
        expected_output: plan.expected_output.clone(),
        output,
        scorer: plan.scorer.clone(),
        score,
        error: error.as_ref().map(CapturedError::from_anyhow),
        started_at,
        finished_at,
        duration_ms,
        metadata: plan.metadata.clone(),
        run_fields: run_fields.into_fields(),
    }
}

async fn score_output(
    task: &TaskDeclaration,
    entry: &PlanEntry<'_>,
    attempt: u32,
    run_id: &str,
    scorer: &ResolvedScorer,
    scorer_name: &str,
    output: &Value,
) -> anyhow::Result<ScoreResult> {
    let case = entry.eval_case;
    let ctx = ScoreContext {
        task: TaskIdentity {
            name: task.name.clone(),
            description: task.description.clone(),
        },
        eval: EvalContext {
            id: entry.plan.eval_id.clone(),
            name: case.name.clone(),
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            scorer: scorer_name.to_string(),
            metadata: case.metadata.clone(),
            params: case.overrides(),
        },
        params: entry.plan.params.clone(),
        run_id: run_id.to_string(),
        attempt,
    };

    let result = scorer
        .score(&ctx, output, &entry.plan.expected_output)
        .await?;
    result.validate(scorer_name)?;
    Ok(result)
}
