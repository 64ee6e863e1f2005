use std::sync::Arc;

use evalrun_core::model::{EvalCase, TaskDeclaration};
use evalrun_core::task::SyncTask;
use evalrun_core::{plan_task, EvalError};
use serde_json::{json, Value};

fn echo() -> TaskDeclaration {
    TaskDeclaration::new(
        "Greeting Task",
        Arc::new(SyncTask::new(|_, input, _, _| Ok(input.clone()))),
    )
}

#[test]
fn one_entry_per_eval_without_matrix() {
    let decl = echo()
        .with_eval(EvalCase::new(json!("a"), json!("a")).with_name("First Case"))
        .with_eval(EvalCase::new(json!("b"), json!("b")).with_id("custom"))
        .with_eval(EvalCase::new(json!("c"), json!("c")));

    let plans = plan_task(&decl).unwrap();
    let ids: Vec<&str> = plans.iter().map(|p| p.eval_id.as_str()).collect();
    assert_eq!(ids, ["first-case", "custom", "eval-3"]);
    assert_eq!(plans[0].plan_id, "plan-greeting-task-first-case-1");
    assert!(plans.iter().all(|p| p.params.is_empty()));
    assert!(plans.iter().all(|p| p.scorer.is_none()));
}

#[test]
fn matrix_expands_to_cartesian_product_in_declared_order() {
    let decl = echo()
        .with_matrix("model", json!(["small", "large"]))
        .with_matrix("temperature", json!([0, 0.5, 1]))
        .with_eval(EvalCase::new(json!(1), json!(1)).with_id("one"))
        .with_eval(EvalCase::new(json!(2), json!(2)).with_id("two"));

    let plans = plan_task(&decl).unwrap();
    assert_eq!(plans.len(), 2 * 2 * 3);

    let first_six: Vec<(Value, Value)> = plans[..6]
        .iter()
        .map(|p| (p.params["model"].clone(), p.params["temperature"].clone()))
        .collect();
    assert_eq!(
        first_six,
        vec![
            (json!("small"), json!(0)),
            (json!("small"), json!(0.5)),
            (json!("small"), json!(1)),
            (json!("large"), json!(0)),
            (json!("large"), json!(0.5)),
            (json!("large"), json!(1)),
        ]
    );
    assert!(plans[..6].iter().all(|p| p.eval_id == "one"));
    assert_eq!(plans[5].plan_id, "plan-greeting-task-one-6");
    assert_eq!(plans[6].eval_id, "two");
}

#[test]
fn eval_overrides_beat_matrix_beat_defaults() {
    let decl = echo()
        .with_default("model", json!("default-model"))
        .with_default("style", json!("plain"))
        .with_default("max_tokens", json!(64))
        .with_matrix("model", json!(["m1"]))
        .with_matrix("style", json!(["fancy"]))
        .with_eval(EvalCase::new(json!(null), json!(null)).with_param("style", json!("terse")));

    let plans = plan_task(&decl).unwrap();
    assert_eq!(plans.len(), 1);
    let params = &plans[0].params;
    assert_eq!(params["max_tokens"], json!(64));
    assert_eq!(params["model"], json!("m1"));
    assert_eq!(params["style"], json!("terse"));
}

#[test]
fn scorer_falls_back_to_task_default() {
    let decl = echo()
        .with_scorer("string_fuzzy_match")
        .with_eval(EvalCase::new(json!("x"), json!("x")))
        .with_eval(EvalCase::new(json!("y"), json!("y")).with_scorer("string_exact_match"));

    let plans = plan_task(&decl).unwrap();
    assert_eq!(plans[0].scorer.as_deref(), Some("string_fuzzy_match"));
    assert_eq!(plans[1].scorer.as_deref(), Some("string_exact_match"));
}

#[test]
fn duplicate_eval_ids_fail_planning() {
    let decl = echo()
        .with_eval(EvalCase::new(json!(1), json!(1)).with_name("Same Name"))
        .with_eval(EvalCase::new(json!(2), json!(2)).with_id("same-name"));

    let err = plan_task(&decl).unwrap_err();
    assert_eq!(
        err,
        EvalError::DuplicateEvalId {
            eval_id: "same-name".into(),
            task: "Greeting Task".into(),
        }
    );
    assert!(err.is_config_error());
}

#[test]
fn empty_or_non_array_matrix_values_fail_planning() {
    let empty = echo()
        .with_matrix("model", json!([]))
        .with_eval(EvalCase::new(json!(1), json!(1)));
    assert!(matches!(
        plan_task(&empty).unwrap_err(),
        EvalError::InvalidMatrix { ref key, .. } if key == "model"
    ));

    let scalar = echo()
        .with_matrix("model", json!("small"))
        .with_eval(EvalCase::new(json!(1), json!(1)));
    assert!(matches!(
        plan_task(&scalar).unwrap_err(),
        EvalError::InvalidMatrix { .. }
    ));
}

#[test]
fn unknown_scorer_fails_planning() {
    let decl = echo()
        .with_eval(EvalCase::new(json!(1), json!(1)).with_scorer("does_not_exist"));

    let err = plan_task(&decl).unwrap_err();
    assert_eq!(
        err.to_string(),
        "scorer \"does_not_exist\" is not registered for task \"Greeting Task\""
    );
}

#[test]
fn planning_twice_is_stable() {
    let decl = echo()
        .with_matrix("k", json!([1, 2]))
        .with_eval(EvalCase::new(json!(1), json!(1)).with_name("Case"));

    assert_eq!(plan_task(&decl).unwrap(), plan_task(&decl).unwrap());
}
