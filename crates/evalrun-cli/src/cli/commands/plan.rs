use std::sync::Arc;

use crate::cli::args::PlanArgs;
use crate::exit_codes;
use crate::template_task::TemplateTask;
use evalrun_core::config::load_suite;
use evalrun_core::model::TaskPlan;
use evalrun_core::plan_task;
use serde_json::Value;

pub fn run(args: &PlanArgs) -> anyhow::Result<i32> {
    let suite = load_suite(&args.config)?;
    let decl = suite.into_declaration(Arc::new(TemplateTask));
    let plans = plan_task(&decl)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        print_table(&plans);
    }
    Ok(exit_codes::SUCCESS)
}

fn print_table(plans: &[TaskPlan]) {
    let width = plans.iter().map(|p| p.plan_id.len()).max().unwrap_or(0);
    for plan in plans {
        println!(
            "{:<width$}  {:<24}  {}",
            plan.plan_id,
            plan.scorer.as_deref().unwrap_or("-"),
            Value::Object(plan.params.clone()),
        );
    }
    eprintln!("{} plan entries", plans.len());
}
