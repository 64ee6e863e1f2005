use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use crate::model::RunRecord;

/// Per-record projection applied before writing.
pub type RunSerializer = Arc<dyn Fn(&RunRecord) -> Value + Send + Sync>;

#[derive(Clone, Default)]
pub struct SaveOptions {
    pub serializer: Option<RunSerializer>,
    pub pretty: bool,
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("serializer", &self.serializer.is_some())
            .field("pretty", &self.pretty)
            .finish()
    }
}

/// Render run records as a JSON array.
pub fn render_runs(runs: &[RunRecord], options: &SaveOptions) -> anyhow::Result<String> {
    let payload = runs
        .iter()
        .map(|run| match &options.serializer {
            Some(serializer) => Ok(serializer(run)),
            None => serde_json::to_value(run),
        })
        .collect::<Result<Vec<Value>, _>>()?;

    let json = if options.pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    Ok(json)
}

pub fn save_runs(runs: &[RunRecord], out: &Path, options: &SaveOptions) -> anyhow::Result<()> {
    let json = render_runs(runs, options)?;
    std::fs::write(out, json).with_context(|| format!("failed to write runs to {}", out.display()))?;
    tracing::debug!(path = %out.display(), runs = runs.len(), "saved runs");
    Ok(())
}

/// Read back records written by [`save_runs`] without a custom serializer.
pub fn load_runs(path: &Path) -> anyhow::Result<Vec<RunRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read runs from {}", path.display()))?;
    let runs = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse runs from {}", path.display()))?;
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapturedError, Params, RunStatus, ScoreResult};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn record(status: RunStatus) -> RunRecord {
        let mut params = Params::new();
        params.insert("model".into(), json!("small"));
        params.insert("temperature".into(), json!(0.5));
        RunRecord {
            id: "run_1".into(),
            status,
            task_name: "greeting".into(),
            task_description: None,
            eval_id: "greets-ada".into(),
            eval_name: Some("Greets Ada".into()),
            attempt: 2,
            params,
            input: json!({"name": "Ada"}),
            expected_output: json!("Hello Ada"),
            output: (status == RunStatus::Success).then(|| json!("Hello Ada")),
            scorer: Some("string_exact_match".into()),
            score: (status == RunStatus::Success)
                .then(|| ScoreResult::new(1.0).with_pass(true).with_label("exact_match")),
            error: (status == RunStatus::Error).then(|| CapturedError {
                name: "Error".into(),
                message: "boom".into(),
                stack: None,
            }),
            started_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 6).unwrap(),
            duration_ms: 1000,
            metadata: None,
            run_fields: None,
        }
    }

    #[test]
    fn empty_runs_render_as_empty_array() {
        assert_eq!(render_runs(&[], &SaveOptions::default()).unwrap(), "[]");
    }

    #[test]
    fn absent_fields_are_omitted() {
        let json = render_runs(&[record(RunStatus::Error)], &SaveOptions::default()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let run = &value[0];
        assert_eq!(run["status"], json!("error"));
        assert_eq!(run["error"]["message"], json!("boom"));
        assert!(run.get("output").is_none());
        assert!(run.get("score").is_none());
        assert_eq!(run["started_at"], json!("2026-01-02T03:04:05Z"));
    }

    #[test]
    fn pretty_output_is_indented() {
        let options = SaveOptions {
            pretty: true,
            ..Default::default()
        };
        let json = render_runs(&[record(RunStatus::Success)], &options).unwrap();
        assert!(json.contains("\n  {\n    \"id\": \"run_1\""));
    }

    #[test]
    fn custom_serializer_projects_each_run() {
        let options = SaveOptions {
            serializer: Some(Arc::new(|run: &RunRecord| {
                json!({"eval": run.eval_id, "attempt": run.attempt})
            })),
            pretty: false,
        };
        let json = render_runs(&[record(RunStatus::Success)], &options).unwrap();
        assert_eq!(json, r#"[{"eval":"greets-ada","attempt":2}]"#);
    }

    #[test]
    fn saved_runs_load_back_field_for_field() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("runs.json");
        let runs = vec![record(RunStatus::Success), record(RunStatus::Error)];

        save_runs(&runs, &path, &SaveOptions::default())?;
        let loaded = load_runs(&path)?;

        assert_eq!(loaded, runs);
        assert_eq!(loaded[0].params["temperature"], json!(0.5));
        assert_eq!(loaded[0].score.as_ref().map(|s| s.score), Some(1.0));
        Ok(())
    }
}
