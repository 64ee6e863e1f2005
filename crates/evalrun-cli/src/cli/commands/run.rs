use std::sync::Arc;

use crate::cli::args::RunArgs;
use crate::exit_codes;
use crate::template_task::TemplateTask;
use evalrun_core::config::load_suite;
use evalrun_core::model::RunRecord;
use evalrun_core::report::console::{print_summary, StatusCounts};
use evalrun_core::report::json::{save_runs, SaveOptions};
use evalrun_core::report::progress::ProgressEvent;
use evalrun_core::run_task;
use evalrun_metrics::{group_by_eval, summarize_scores, AttemptClass, PassRateOptions};

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let suite = load_suite(&args.config)?;

    let mut options = suite.run_options();
    if let Some(runs) = args.runs_per_eval {
        options.runs_per_eval = runs;
    }
    if let Some(limit) = args.max_concurrency {
        options.max_concurrency = limit;
    }
    options.verbose |= args.verbose;
    options = options.with_progress(Arc::new(|event: ProgressEvent| {
        tracing::debug!(done = event.done, total = event.total, "progress");
    }));

    let decl = suite.into_declaration(Arc::new(TemplateTask));
    let result = run_task(&decl, &options).await?;

    print_summary(&result.runs);
    print_scores(&result.runs, args.threshold);

    if let Some(out) = &args.out {
        let save = SaveOptions {
            pretty: args.pretty,
            ..Default::default()
        };
        save_runs(&result.runs, out, &save)?;
        eprintln!("Wrote {} runs to {}", result.runs.len(), out.display());
    }

    Ok(exit_code(&result.runs))
}

fn print_scores(runs: &[RunRecord], threshold: Option<f64>) {
    let summary = summarize_scores(
        runs,
        PassRateOptions {
            threshold,
            include_missing: false,
        },
    );
    let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
    eprintln!(
        "Scores: scored={}/{} mean={} median={} pass_rate={}",
        summary.scored,
        summary.total,
        fmt(summary.average_score),
        fmt(summary.median_score),
        fmt(summary.pass_rate),
    );

    for group in group_by_eval(runs).iter().filter(|g| g.runs.len() > 1) {
        let class = group.classify();
        if matches!(class, AttemptClass::Flaky | AttemptClass::Unstable) {
            eprintln!("  {} is {:?} across {} attempts", group.eval_id, class, group.runs.len());
        }
    }
}

fn exit_code(runs: &[RunRecord]) -> i32 {
    if StatusCounts::from_runs(runs).all_ok() {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUN_FAILED
    }
}
