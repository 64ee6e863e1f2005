//! Scorer interface, registry and built-in scorers.

mod builtin;
mod compare;

pub use builtin::{BuiltinScorer, OBJECT_FUZZY_THRESHOLD, STRING_FUZZY_THRESHOLD};
pub use compare::{deep_equal, flatten_leaves, levenshtein, normalize_text, same_value};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Params, ScoreResult};

/// Task identity handed to scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskIdentity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The originating eval case, with its resolved id and scorer name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalContext {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub input: Value,
    pub expected_output: Value,
    pub scorer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
    /// Case-level parameter overrides.
    #[serde(flatten)]
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreContext {
    pub task: TaskIdentity,
    pub eval: EvalContext,
    /// Fully merged parameters of the plan entry.
    pub params: Params,
    pub run_id: String,
    pub attempt: u32,
}

/// Grades an actual output against an expected output.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        ctx: &ScoreContext,
        output: &Value,
        expected: &Value,
    ) -> anyhow::Result<ScoreResult>;
}

/// Adapter for synchronous scoring closures.
pub struct FnScorer<F> {
    f: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&ScoreContext, &Value, &Value) -> anyhow::Result<ScoreResult> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Scorer for FnScorer<F>
where
    F: Fn(&ScoreContext, &Value, &Value) -> anyhow::Result<ScoreResult> + Send + Sync,
{
    async fn score(
        &self,
        ctx: &ScoreContext,
        output: &Value,
        expected: &Value,
    ) -> anyhow::Result<ScoreResult> {
        (self.f)(ctx, output, expected)
    }
}

/// User-declared scorers, keyed by name.
#[derive(Clone, Default)]
pub struct ScorerRegistry {
    scorers: BTreeMap<String, Arc<dyn Scorer>>,
}

impl ScorerRegistry {
    pub fn register(&mut self, name: impl Into<String>, scorer: Arc<dyn Scorer>) {
        self.scorers.insert(name.into(), scorer);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Scorer>> {
        self.scorers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scorers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }
}

impl fmt::Debug for ScorerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.scorers.keys()).finish()
    }
}

/// A scorer resolved by name: user registry first, built-ins second.
#[derive(Clone)]
pub enum ResolvedScorer {
    Custom(Arc<dyn Scorer>),
    Builtin(BuiltinScorer),
}

impl ResolvedScorer {
    pub async fn score(
        &self,
        ctx: &ScoreContext,
        output: &Value,
        expected: &Value,
    ) -> anyhow::Result<ScoreResult> {
        match self {
            Self::Custom(scorer) => scorer.score(ctx, output, expected).await,
            Self::Builtin(scorer) => scorer.score(ctx, output, expected).await,
        }
    }
}

impl fmt::Debug for ResolvedScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom"),
            Self::Builtin(b) => write!(f, "Builtin({})", b.name()),
        }
    }
}

pub fn resolve_scorer(name: &str, registry: &ScorerRegistry) -> Option<ResolvedScorer> {
    if let Some(custom) = registry.get(name) {
        return Some(ResolvedScorer::Custom(Arc::clone(custom)));
    }
    BuiltinScorer::from_name(name).map(ResolvedScorer::Builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_scorer_shadows_builtin() {
        let mut registry = ScorerRegistry::default();
        registry.register(
            "string_exact_match",
            Arc::new(FnScorer::new(|_, _, _| Ok(ScoreResult::new(0.25)))),
        );

        let resolved = resolve_scorer("string_exact_match", &registry).unwrap();
        assert!(matches!(resolved, ResolvedScorer::Custom(_)));
    }

    #[test]
    fn builtins_resolve_without_registry() {
        let registry = ScorerRegistry::default();
        assert!(matches!(
            resolve_scorer("object_fuzzy_match", &registry),
            Some(ResolvedScorer::Builtin(BuiltinScorer::ObjectFuzzyMatch))
        ));
        assert!(resolve_scorer("nope", &registry).is_none());
    }
}
