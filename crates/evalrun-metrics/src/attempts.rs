use evalrun_core::model::{Params, RunRecord};
use serde::{Deserialize, Serialize};

/// Outcome class of repeated attempts of one plan entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptClass {
    DeterministicPass,
    DeterministicFail,
    Flaky,    // fail -> pass
    Unstable, // any other pass/fail mix
    Error,
    Unscored,
}

/// Classify attempts given in attempt order.
///
/// Attempts without a pass verdict are ignored unless every attempt lacks
/// one, in which case the group is `Unscored`.
pub fn classify_attempts(attempts: &[&RunRecord]) -> AttemptClass {
    if attempts.iter().any(|run| run.error.is_some()) {
        return AttemptClass::Error;
    }

    let verdicts: Vec<bool> = attempts
        .iter()
        .filter_map(|run| run.score.as_ref().and_then(|s| s.pass))
        .collect();

    let any_pass = verdicts.iter().any(|pass| *pass);
    let any_fail = verdicts.iter().any(|pass| !*pass);

    match (any_pass, any_fail) {
        (false, false) => AttemptClass::Unscored,
        (true, false) => AttemptClass::DeterministicPass,
        (false, true) => AttemptClass::DeterministicFail,
        (true, true) => {
            let first_fail = verdicts.iter().position(|pass| !*pass);
            let first_pass = verdicts.iter().position(|pass| *pass);
            let ends_passing = verdicts.last() == Some(&true);
            match (first_fail, first_pass) {
                (Some(f), Some(p)) if f < p && ends_passing => AttemptClass::Flaky,
                _ => AttemptClass::Unstable,
            }
        }
    }
}

/// Records of one (eval id, params) pair.
#[derive(Debug, Clone)]
pub struct EvalGroup<'a> {
    pub eval_id: &'a str,
    pub params: &'a Params,
    pub runs: Vec<&'a RunRecord>,
}

impl EvalGroup<'_> {
    pub fn classify(&self) -> AttemptClass {
        classify_attempts(&self.runs)
    }
}

/// Group records by eval id and merged params, in first-seen order.
/// Within a group, records keep their input order.
pub fn group_by_eval(runs: &[RunRecord]) -> Vec<EvalGroup<'_>> {
    let mut groups: Vec<EvalGroup<'_>> = Vec::new();
    for run in runs {
        match groups
            .iter_mut()
            .find(|g| g.eval_id == run.eval_id && *g.params == run.params)
        {
            Some(group) => group.runs.push(run),
            None => groups.push(EvalGroup {
                eval_id: &run.eval_id,
                params: &run.params,
                runs: vec![run],
            }),
        }
    }
    groups
}
