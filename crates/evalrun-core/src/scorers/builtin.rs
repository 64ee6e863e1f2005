use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::compare::{deep_equal, flatten_leaves, levenshtein, normalize_text, same_value};
use super::{ScoreContext, Scorer};
use crate::errors::EvalError;
use crate::model::ScoreResult;

pub const STRING_FUZZY_THRESHOLD: f64 = 0.9;
pub const OBJECT_FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinScorer {
    StringExactMatch,
    StringFuzzyMatch,
    ObjectExactMatch,
    ObjectFuzzyMatch,
}

impl BuiltinScorer {
    pub const ALL: [BuiltinScorer; 4] = [
        Self::StringExactMatch,
        Self::StringFuzzyMatch,
        Self::ObjectExactMatch,
        Self::ObjectFuzzyMatch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::StringExactMatch => "string_exact_match",
            Self::StringFuzzyMatch => "string_fuzzy_match",
            Self::ObjectExactMatch => "object_exact_match",
            Self::ObjectFuzzyMatch => "object_fuzzy_match",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Pure scoring; the context is not consulted by any built-in.
    pub fn evaluate(self, output: &Value, expected: &Value) -> Result<ScoreResult, EvalError> {
        match self {
            Self::StringExactMatch => string_exact_match(output, expected),
            Self::StringFuzzyMatch => string_fuzzy_match(output, expected),
            Self::ObjectExactMatch => object_exact_match(output, expected),
            Self::ObjectFuzzyMatch => object_fuzzy_match(output, expected),
        }
    }
}

#[async_trait]
impl Scorer for BuiltinScorer {
    async fn score(
        &self,
        _ctx: &ScoreContext,
        output: &Value,
        expected: &Value,
    ) -> anyhow::Result<ScoreResult> {
        Ok(self.evaluate(output, expected)?)
    }
}

fn expect_str<'a>(value: &'a Value, label: &'static str) -> Result<&'a str, EvalError> {
    value.as_str().ok_or(EvalError::TypeMismatch {
        label,
        expected: "a string",
    })
}

fn expect_object(value: &Value, label: &'static str) -> Result<(), EvalError> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(()),
        _ => Err(EvalError::TypeMismatch {
            label,
            expected: "an object",
        }),
    }
}

fn verdict(pass: bool) -> ScoreResult {
    ScoreResult::new(if pass { 1.0 } else { 0.0 })
        .with_pass(pass)
        .with_label("exact_match")
}

fn string_exact_match(output: &Value, expected: &Value) -> Result<ScoreResult, EvalError> {
    let output = expect_str(output, "output")?;
    let expected = expect_str(expected, "expected output")?;
    Ok(verdict(output == expected))
}

fn string_fuzzy_match(output: &Value, expected: &Value) -> Result<ScoreResult, EvalError> {
    let output = normalize_text(expect_str(output, "output")?);
    let expected = normalize_text(expect_str(expected, "expected output")?);
    let max_length = output.chars().count().max(expected.chars().count());

    if max_length == 0 {
        return Ok(ScoreResult::new(1.0)
            .with_pass(true)
            .with_label("fuzzy_match")
            .with_details(json!({"distance": 0, "maxLength": 0})));
    }

    let distance = levenshtein(&output, &expected);
    let score = (1.0 - distance as f64 / max_length as f64).clamp(0.0, 1.0);

    Ok(ScoreResult::new(score)
        .with_pass(score >= STRING_FUZZY_THRESHOLD)
        .with_label("fuzzy_match")
        .with_details(json!({"distance": distance, "maxLength": max_length})))
}

fn object_exact_match(output: &Value, expected: &Value) -> Result<ScoreResult, EvalError> {
    expect_object(output, "output")?;
    expect_object(expected, "expected output")?;
    Ok(verdict(deep_equal(output, expected)))
}

fn object_fuzzy_match(output: &Value, expected: &Value) -> Result<ScoreResult, EvalError> {
    expect_object(output, "output")?;
    expect_object(expected, "expected output")?;

    let output_leaves = flatten_leaves(output);
    let expected_leaves = flatten_leaves(expected);
    let all_paths: BTreeSet<&String> = output_leaves.keys().chain(expected_leaves.keys()).collect();
    let total = all_paths.len();

    if total == 0 {
        return Ok(ScoreResult::new(1.0)
            .with_pass(true)
            .with_label("fuzzy_match")
            .with_details(json!({"matched": 0, "total": 0})));
    }

    let matched = all_paths
        .iter()
        .filter(|path| {
            match (output_leaves.get(path.as_str()), expected_leaves.get(path.as_str())) {
                (Some(a), Some(b)) => same_value(a, b),
                _ => false,
            }
        })
        .count();
    let score = matched as f64 / total as f64;

    Ok(ScoreResult::new(score)
        .with_pass(score >= OBJECT_FUZZY_THRESHOLD)
        .with_label("fuzzy_match")
        .with_details(json!({"matched": matched, "total": total})))
}
