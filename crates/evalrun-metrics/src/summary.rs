use evalrun_core::model::{RunRecord, ScoreResult};
use serde::{Deserialize, Serialize};

/// Anything that may carry a score.
pub trait Scored {
    fn score_result(&self) -> Option<&ScoreResult>;
}

impl Scored for RunRecord {
    fn score_result(&self) -> Option<&ScoreResult> {
        self.score.as_ref()
    }
}

impl Scored for Option<ScoreResult> {
    fn score_result(&self) -> Option<&ScoreResult> {
        self.as_ref()
    }
}

impl<T: Scored + ?Sized> Scored for &T {
    fn score_result(&self) -> Option<&ScoreResult> {
        (**self).score_result()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PassRateOptions {
    /// Pass mark for results that carry no explicit verdict.
    pub threshold: Option<f64>,
    /// Count unscored items in the denominator.
    pub include_missing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: usize,
    pub scored: usize,
    pub average_score: Option<f64>,
    pub median_score: Option<f64>,
    pub pass_rate: Option<f64>,
}

fn collect_scores<T: Scored>(items: &[T]) -> Vec<f64> {
    items
        .iter()
        .filter_map(|item| item.score_result().map(|s| s.score))
        .collect()
}

pub fn mean_score<T: Scored>(items: &[T]) -> Option<f64> {
    let scores = collect_scores(items);
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

pub fn median_score<T: Scored>(items: &[T]) -> Option<f64> {
    let mut scores = collect_scores(items);
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(f64::total_cmp);
    let mid = scores.len() / 2;
    if scores.len() % 2 == 0 {
        Some((scores[mid - 1] + scores[mid]) / 2.0)
    } else {
        Some(scores[mid])
    }
}

pub fn pass_rate<T: Scored>(items: &[T], options: PassRateOptions) -> Option<f64> {
    let mut passed = 0usize;
    let mut total = 0usize;

    for item in items {
        match item.score_result() {
            None => {
                if options.include_missing {
                    total += 1;
                }
            }
            Some(ScoreResult {
                pass: Some(pass), ..
            }) => {
                total += 1;
                if *pass {
                    passed += 1;
                }
            }
            Some(result) => {
                if let Some(threshold) = options.threshold {
                    total += 1;
                    if result.score >= threshold {
                        passed += 1;
                    }
                }
            }
        }
    }

    if total == 0 {
        return None;
    }
    Some(passed as f64 / total as f64)
}

pub fn summarize_scores<T: Scored>(items: &[T], options: PassRateOptions) -> ScoreSummary {
    ScoreSummary {
        total: items.len(),
        scored: collect_scores(items).len(),
        average_score: mean_score(items),
        median_score: median_score(items),
        pass_rate: pass_rate(items, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(score: f64, pass: Option<bool>) -> Option<ScoreResult> {
        let mut result = ScoreResult::new(score);
        result.pass = pass;
        Some(result)
    }

    #[test]
    fn mean_and_median_ignore_unscored_items() {
        let items = vec![scored(1.0, None), None, scored(0.0, None), scored(0.5, None)];
        assert_eq!(mean_score(&items), Some(0.5));
        assert_eq!(median_score(&items), Some(0.5));

        let even = vec![scored(0.9, None), scored(0.1, None), scored(0.4, None), scored(0.2, None)];
        assert!((median_score(&even).unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_or_unscored_yield_none() {
        let none: Vec<Option<ScoreResult>> = vec![None, None];
        assert_eq!(mean_score(&none), None);
        assert_eq!(median_score(&none), None);
        assert_eq!(pass_rate(&none, PassRateOptions::default()), None);
        assert_eq!(mean_score::<Option<ScoreResult>>(&[]), None);
    }

    #[test]
    fn explicit_verdicts_win_over_threshold() {
        let items = vec![
            scored(0.1, Some(true)),
            scored(0.9, Some(false)),
            scored(0.8, None),
            scored(0.2, None),
            None,
        ];

        // Threshold-less results are skipped.
        assert_eq!(pass_rate(&items, PassRateOptions::default()), Some(0.5));

        let with_threshold = PassRateOptions {
            threshold: Some(0.5),
            include_missing: false,
        };
        assert_eq!(pass_rate(&items, with_threshold), Some(0.5));

        let strict = PassRateOptions {
            threshold: Some(0.5),
            include_missing: true,
        };
        assert_eq!(pass_rate(&items, strict), Some(0.4));
    }

    #[test]
    fn summary_combines_everything() {
        let items = vec![scored(1.0, Some(true)), scored(0.0, Some(false)), None];
        let summary = summarize_scores(&items, PassRateOptions::default());
        assert_eq!(
            summary,
            ScoreSummary {
                total: 3,
                scored: 2,
                average_score: Some(0.5),
                median_score: Some(0.5),
                pass_rate: Some(0.5),
            }
        );
    }
}
