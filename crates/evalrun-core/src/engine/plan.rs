//! Expansion of a task declaration into concrete plan entries.

use std::collections::HashSet;

use serde_json::Value;

use crate::errors::EvalError;
use crate::model::{EvalCase, Params, TaskDeclaration, TaskPlan};
use crate::scorers::{resolve_scorer, ResolvedScorer};

/// One (eval case x matrix combination) unit of work, fully resolved.
#[derive(Debug, Clone)]
pub(crate) struct PlanEntry<'a> {
    pub plan: TaskPlan,
    pub eval_case: &'a EvalCase,
    pub scorer: Option<ResolvedScorer>,
}

pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for c in value.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

fn eval_id(case: &EvalCase, index: usize) -> String {
    if let Some(id) = case.id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    if let Some(name) = case.name.as_deref() {
        let slug = slugify(name);
        if !slug.is_empty() {
            return slug;
        }
    }

    format!("eval-{}", index + 1)
}

fn plan_id(task_name: &str, eval_id: &str, matrix_index: usize) -> String {
    let mut task_slug = slugify(task_name);
    if task_slug.is_empty() {
        task_slug = "task".to_string();
    }
    let mut eval_slug = slugify(eval_id);
    if eval_slug.is_empty() {
        eval_slug = format!("eval-{}", matrix_index + 1);
    }
    format!("plan-{task_slug}-{eval_slug}-{}", matrix_index + 1)
}

/// Cartesian product of the matrix, keys in declaration order, values in
/// declared order. No matrix (or an empty one) is a single empty combination.
pub(crate) fn matrix_combinations(
    matrix: Option<&Params>,
    task_name: &str,
) -> Result<Vec<Params>, EvalError> {
    let mut combinations = vec![Params::new()];
    let Some(matrix) = matrix else {
        return Ok(combinations);
    };

    for (key, values) in matrix {
        let values = match values {
            Value::Array(values) if !values.is_empty() => values,
            _ => {
                return Err(EvalError::InvalidMatrix {
                    key: key.clone(),
                    task: task_name.to_string(),
                })
            }
        };

        let mut next = Vec::with_capacity(combinations.len() * values.len());
        for combo in &combinations {
            for value in values {
                let mut extended = combo.clone();
                extended.insert(key.clone(), value.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }

    Ok(combinations)
}

/// Precedence: defaults < matrix combination < eval overrides.
fn merge_params(defaults: &Params, combo: &Params, overrides: &Params) -> Params {
    let mut params = defaults.clone();
    for (key, value) in combo.iter().chain(overrides) {
        params.insert(key.clone(), value.clone());
    }
    params
}

/// Expand a declaration into plan entries: eval-case order outer, matrix
/// combination order inner. Any configuration error aborts before a single
/// entry is returned.
pub(crate) fn build_plan_entries(task: &TaskDeclaration) -> Result<Vec<PlanEntry<'_>>, EvalError> {
    let combinations = matrix_combinations(task.matrix.as_ref(), &task.name)?;
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(task.evals.len() * combinations.len());

    for (index, case) in task.evals.iter().enumerate() {
        let eval_id = eval_id(case, index);
        if !seen.insert(eval_id.clone()) {
            return Err(EvalError::DuplicateEvalId {
                eval_id,
                task: task.name.clone(),
            });
        }

        let overrides = case.overrides();
        let scorer_name = case.scorer.clone().or_else(|| task.scorer.clone());
        let scorer = match scorer_name.as_deref() {
            Some(name) => Some(resolve_scorer(name, &task.scorers).ok_or_else(|| {
                EvalError::UnknownScorer {
                    scorer: name.to_string(),
                    task: task.name.clone(),
                }
            })?),
            None => None,
        };

        for (matrix_index, combo) in combinations.iter().enumerate() {
            let plan = TaskPlan {
                plan_id: plan_id(&task.name, &eval_id, matrix_index),
                task_name: task.name.clone(),
                eval_id: eval_id.clone(),
                eval_name: case.name.clone(),
                params: merge_params(&task.defaults, combo, &overrides),
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                scorer: scorer_name.clone(),
                metadata: case.metadata.clone(),
            };
            entries.push(PlanEntry {
                plan,
                eval_case: case,
                scorer: scorer.clone(),
            });
        }
    }

    tracing::debug!(task = %task.name, entries = entries.len(), "expanded plan");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::SyncTask;
    use serde_json::json;
    use std::sync::Arc;

    fn declaration(name: &str) -> TaskDeclaration {
        TaskDeclaration::new(name, Arc::new(SyncTask::new(|_, input, _, _| Ok(input.clone()))))
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("--Already-Slugged--"), "already-slugged");
        assert_eq!(slugify("Ünïcode Näme"), "n-code-n-me");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Case 42"), "case-42");
    }

    #[test]
    fn eval_id_prefers_explicit_then_name_then_position() {
        let explicit = EvalCase::new(json!(1), json!(1)).with_id("Custom_ID");
        assert_eq!(eval_id(&explicit, 0), "Custom_ID");

        let named = EvalCase::new(json!(1), json!(1)).with_name("Greets Ada");
        assert_eq!(eval_id(&named, 0), "greets-ada");

        let symbols = EvalCase::new(json!(1), json!(1)).with_name("???");
        assert_eq!(eval_id(&symbols, 2), "eval-3");

        let bare = EvalCase::new(json!(1), json!(1));
        assert_eq!(eval_id(&bare, 0), "eval-1");
    }

    #[test]
    fn plan_id_slugs_task_and_eval() {
        assert_eq!(plan_id("My Task", "Custom_ID", 0), "plan-my-task-custom-id-1");
        assert_eq!(plan_id("!!", "e", 2), "plan-task-e-3");
        assert_eq!(plan_id("t", "??", 1), "plan-t-eval-2-2");
    }

    #[test]
    fn matrix_product_order_is_stable() {
        let mut matrix = Params::new();
        matrix.insert("model".into(), json!(["a", "b"]));
        matrix.insert("temp".into(), json!([0, 1, 2]));

        let combos = matrix_combinations(Some(&matrix), "t").unwrap();
        let flat: Vec<(Value, Value)> = combos
            .iter()
            .map(|c| (c["model"].clone(), c["temp"].clone()))
            .collect();
        assert_eq!(
            flat,
            vec![
                (json!("a"), json!(0)),
                (json!("a"), json!(1)),
                (json!("a"), json!(2)),
                (json!("b"), json!(0)),
                (json!("b"), json!(1)),
                (json!("b"), json!(2)),
            ]
        );
    }

    #[test]
    fn missing_or_empty_matrix_is_one_empty_combination() {
        assert_eq!(matrix_combinations(None, "t").unwrap(), vec![Params::new()]);
        assert_eq!(
            matrix_combinations(Some(&Params::new()), "t").unwrap(),
            vec![Params::new()]
        );
    }

    #[test]
    fn matrix_rejects_empty_and_scalar_entries() {
        let mut empty = Params::new();
        empty.insert("k".into(), json!([]));
        assert_eq!(
            matrix_combinations(Some(&empty), "t").unwrap_err(),
            EvalError::InvalidMatrix {
                key: "k".into(),
                task: "t".into()
            }
        );

        let mut scalar = Params::new();
        scalar.insert("k".into(), json!(3));
        assert!(matrix_combinations(Some(&scalar), "t").is_err());
    }

    #[test]
    fn merge_precedence_is_defaults_then_matrix_then_eval() {
        let decl = declaration("merge")
            .with_default("a", json!("default"))
            .with_default("b", json!("default"))
            .with_default("c", json!("default"))
            .with_matrix("a", json!(["matrix"]))
            .with_matrix("b", json!(["matrix"]))
            .with_eval(EvalCase::new(json!(1), json!(1)).with_param("a", json!("eval")));

        let entries = build_plan_entries(&decl).unwrap();
        let params = &entries[0].plan.params;
        assert_eq!(params["a"], json!("eval"));
        assert_eq!(params["b"], json!("matrix"));
        assert_eq!(params["c"], json!("default"));
    }

    #[test]
    fn scorer_override_beats_task_default() {
        let decl = declaration("scored")
            .with_scorer("string_exact_match")
            .with_eval(EvalCase::new(json!("a"), json!("a")))
            .with_eval(EvalCase::new(json!("b"), json!("b")).with_scorer("string_fuzzy_match"));

        let entries = build_plan_entries(&decl).unwrap();
        assert_eq!(entries[0].plan.scorer.as_deref(), Some("string_exact_match"));
        assert_eq!(entries[1].plan.scorer.as_deref(), Some("string_fuzzy_match"));
        assert!(entries.iter().all(|e| e.scorer.is_some()));
    }

    #[test]
    fn unscored_entries_carry_no_scorer() {
        let decl = declaration("plain").with_eval(EvalCase::new(json!(1), json!(1)));
        let entries = build_plan_entries(&decl).unwrap();
        assert!(entries[0].plan.scorer.is_none());
        assert!(entries[0].scorer.is_none());
    }

    #[test]
    fn unknown_scorer_is_fatal() {
        let decl = declaration("bad")
            .with_eval(EvalCase::new(json!(1), json!(1)))
            .with_eval(EvalCase::new(json!(1), json!(1)).with_scorer("nope"));

        let err = build_plan_entries(&decl).unwrap_err();
        assert_eq!(
            err,
            EvalError::UnknownScorer {
                scorer: "nope".into(),
                task: "bad".into()
            }
        );
    }

    #[test]
    fn derived_id_colliding_with_explicit_id_is_fatal() {
        let decl = declaration("dup")
            .with_eval(EvalCase::new(json!(1), json!(1)).with_id("greets-ada"))
            .with_eval(EvalCase::new(json!(1), json!(1)).with_name("Greets Ada"));

        assert!(matches!(
            build_plan_entries(&decl),
            Err(EvalError::DuplicateEvalId { eval_id, .. }) if eval_id == "greets-ada"
        ));
    }
}
