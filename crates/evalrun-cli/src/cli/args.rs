use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "evalrun",
    version,
    about = "Plan and execute eval suites with bounded concurrency"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a sample suite file
    Init(InitArgs),
    /// Print the expanded plan without running anything
    Plan(PlanArgs),
    /// Execute the suite and report results
    Run(RunArgs),
}

#[derive(Args)]
pub struct InitArgs {
    #[arg(long, default_value = "eval.yaml")]
    pub path: PathBuf,

    /// overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[arg(long, default_value = "eval.yaml", env = "EVALRUN_CONFIG")]
    pub config: PathBuf,

    /// print plan entries as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long, default_value = "eval.yaml", env = "EVALRUN_CONFIG")]
    pub config: PathBuf,

    /// write run records to this JSON file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// indent the JSON written by --out
    #[arg(long)]
    pub pretty: bool,

    /// attempts per plan entry (overrides settings.runs_per_eval)
    #[arg(long)]
    pub runs_per_eval: Option<u32>,

    /// executions in flight at once (overrides settings.max_concurrency)
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// log each execution at info level
    #[arg(long)]
    pub verbose: bool,

    /// pass mark for scores that carry no explicit verdict
    #[arg(long)]
    pub threshold: Option<f64>,
}
