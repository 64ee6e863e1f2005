use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EvalError;
use crate::scorers::{Scorer, ScorerRegistry};
use crate::task::TaskRunner;

/// String-keyed parameter mapping. Key order follows insertion order.
pub type Params = serde_json::Map<String, Value>;

/// Eval-case keys that are never treated as parameter overrides.
pub const RESERVED_EVAL_KEYS: [&str; 6] = ["id", "name", "input", "expected_output", "scorer", "metadata"];

/// One named input/expected-output pair.
///
/// Any key outside [`RESERVED_EVAL_KEYS`] lands in `params` and overrides the
/// task defaults and matrix values for this case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
    #[serde(flatten)]
    pub params: Params,
}

impl EvalCase {
    pub fn new(input: Value, expected_output: Value) -> Self {
        Self {
            id: None,
            name: None,
            input,
            expected_output,
            scorer: None,
            metadata: None,
            params: Params::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_scorer(mut self, scorer: impl Into<String>) -> Self {
        self.scorer = Some(scorer.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Params) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a parameter override. Reserved keys are ignored.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !RESERVED_EVAL_KEYS.contains(&key.as_str()) {
            self.params.insert(key, value);
        }
        self
    }

    /// Parameter overrides carried by this case, reserved keys excluded.
    pub fn overrides(&self) -> Params {
        self.params
            .iter()
            .filter(|(key, _)| !RESERVED_EVAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Declarative description of a task under evaluation.
///
/// Planning never mutates a declaration; the same value can be planned and run
/// any number of times.
#[derive(Clone)]
pub struct TaskDeclaration {
    pub name: String,
    pub description: Option<String>,
    pub task: Arc<dyn TaskRunner>,
    pub defaults: Params,
    /// Parameter name -> list of candidate values. Validated during planning.
    pub matrix: Option<Params>,
    pub scorers: ScorerRegistry,
    pub scorer: Option<String>,
    pub evals: Vec<EvalCase>,
}

impl TaskDeclaration {
    pub fn new(name: impl Into<String>, task: Arc<dyn TaskRunner>) -> Self {
        Self {
            name: name.into(),
            description: None,
            task,
            defaults: Params::new(),
            matrix: None,
            scorers: ScorerRegistry::default(),
            scorer: None,
            evals: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_defaults(mut self, defaults: Params) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_default(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    pub fn with_matrix(mut self, key: impl Into<String>, values: Value) -> Self {
        self.matrix
            .get_or_insert_with(Params::new)
            .insert(key.into(), values);
        self
    }

    pub fn with_scorer(mut self, scorer: impl Into<String>) -> Self {
        self.scorer = Some(scorer.into());
        self
    }

    pub fn with_custom_scorer(mut self, name: impl Into<String>, scorer: Arc<dyn Scorer>) -> Self {
        self.scorers.register(name, scorer);
        self
    }

    pub fn with_eval(mut self, eval: EvalCase) -> Self {
        self.evals.push(eval);
        self
    }

    pub fn with_evals(mut self, evals: impl IntoIterator<Item = EvalCase>) -> Self {
        self.evals.extend(evals);
        self
    }
}

impl fmt::Debug for TaskDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDeclaration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("defaults", &self.defaults)
            .field("matrix", &self.matrix)
            .field("scorers", &self.scorers)
            .field("scorer", &self.scorer)
            .field("evals", &self.evals)
            .finish_non_exhaustive()
    }
}

/// Public projection of a plan entry, as returned by `plan_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub plan_id: String,
    pub task_name: String,
    pub eval_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_name: Option<String>,
    pub params: Params,
    pub input: Value,
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
}

/// Outcome of one scorer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Params>,
}

impl ScoreResult {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            pass: None,
            label: None,
            details: None,
        }
    }

    pub fn with_pass(mut self, pass: bool) -> Self {
        self.pass = Some(pass);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        if let Value::Object(map) = details {
            self.details = Some(map);
        }
        self
    }

    /// Validate an untyped scorer return value.
    pub fn from_value(value: Value, scorer: &str) -> Result<Self, EvalError> {
        let Value::Object(mut map) = value else {
            return Err(EvalError::ScorerContract {
                scorer: scorer.to_string(),
                reason: "returned an invalid score result object".into(),
            });
        };

        let score = map
            .remove("score")
            .and_then(|s| s.as_f64())
            .ok_or_else(|| non_numeric(scorer))?;

        let result = Self {
            score,
            pass: map.remove("pass").and_then(|p| p.as_bool()),
            label: map
                .remove("label")
                .and_then(|l| l.as_str().map(ToString::to_string)),
            details: match map.remove("details") {
                Some(Value::Object(details)) => Some(details),
                _ => None,
            },
        };
        result.validate(scorer)?;
        Ok(result)
    }

    pub(crate) fn validate(&self, scorer: &str) -> Result<(), EvalError> {
        if self.score.is_nan() {
            return Err(non_numeric(scorer));
        }
        Ok(())
    }
}

fn non_numeric(scorer: &str) -> EvalError {
    EvalError::ScorerContract {
        scorer: scorer.to_string(),
        reason: "returned a non-numeric score value".into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
}

/// Serializable form of an error caught during an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    pub name: String,
    pub message: String,
    /// Full cause chain; absent when the error has no causes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl CapturedError {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let name = err
            .downcast_ref::<EvalError>()
            .map(EvalError::kind)
            .unwrap_or("Error");
        let stack = (err.chain().count() > 1).then(|| format!("{err:?}"));
        Self {
            name: name.to_string(),
            message: err.to_string(),
            stack,
        }
    }
}

/// Terminal artifact of one execution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub status: RunStatus,
    pub task_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    pub eval_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_name: Option<String>,
    pub attempt: u32,
    pub params: Params,
    pub input: Value,
    pub expected_output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CapturedError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_fields: Option<Params>,
}

impl RunRecord {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Display label: eval name when present, else the eval id.
    pub fn label(&self) -> &str {
        self.eval_name.as_deref().unwrap_or(&self.eval_id)
    }
}
