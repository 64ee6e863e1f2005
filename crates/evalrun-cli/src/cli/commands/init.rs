use crate::cli::args::InitArgs;
use crate::exit_codes;
use evalrun_core::config::write_sample_suite;

pub fn run(args: &InitArgs) -> anyhow::Result<i32> {
    if args.path.exists() && !args.force {
        eprintln!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
        return Ok(exit_codes::RUN_FAILED);
    }

    write_sample_suite(&args.path)?;
    println!("Created {}", args.path.display());
    println!("Next: evalrun plan --config {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
