use crate::model::RunRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub passed: usize,
    pub failed: usize,
    pub unscored: usize,
    pub errored: usize,
}

impl StatusCounts {
    pub fn from_runs(runs: &[RunRecord]) -> Self {
        let mut counts = Self::default();
        for run in runs {
            match (&run.error, &run.score) {
                (Some(_), _) => counts.errored += 1,
                (None, Some(score)) if score.pass == Some(false) => counts.failed += 1,
                (None, Some(_)) => counts.passed += 1,
                (None, None) => counts.unscored += 1,
            }
        }
        counts
    }

    pub fn all_ok(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// One line per run, then totals, on stderr.
pub fn print_summary(runs: &[RunRecord]) {
    for run in runs {
        let outcome = match (&run.error, &run.score) {
            (Some(e), _) => format!("error: {}", e.message),
            (None, Some(score)) => match score.pass {
                Some(true) => format!("pass ({:.3})", score.score),
                Some(false) => format!("fail ({:.3})", score.score),
                None => format!("score {:.3}", score.score),
            },
            (None, None) => "ok (unscored)".to_string(),
        };
        eprintln!(
            "  {} #{} [{}ms] {}",
            run.label(),
            run.attempt,
            run.duration_ms,
            outcome
        );
    }

    let counts = StatusCounts::from_runs(runs);
    eprintln!(
        "Results: pass={} fail={} unscored={} error={}",
        counts.passed, counts.failed, counts.unscored, counts.errored
    );
}
