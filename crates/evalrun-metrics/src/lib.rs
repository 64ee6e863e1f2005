//! Aggregation over run records: score statistics, pass rates and
//! classification of repeated attempts.

mod attempts;
mod summary;

pub use attempts::{classify_attempts, group_by_eval, AttemptClass, EvalGroup};
pub use summary::{
    mean_score, median_score, pass_rate, summarize_scores, PassRateOptions, ScoreSummary, Scored,
};
