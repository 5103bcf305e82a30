//! `parity compare`: regression comparison of two artifact collections.

use std::path::PathBuf;

use clap::Args;
use parity_batch::{load_collection, BatchComparer, WorkerPool};
use parity_types::{load_expected_changes, save_model};
use tracing::info;

use super::{RunArgs, Status};
use crate::error::CliResult;
use crate::output;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Directory holding the reference collection
    #[arg(long)]
    pub input_dir_a: PathBuf,

    /// Directory holding the collection under test
    #[arg(long)]
    pub input_dir_b: PathBuf,

    /// Report file (.json or .yaml)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Expected changes that explain known differences
    #[arg(long)]
    pub expected_changes: Option<PathBuf>,

    /// File extension of collection members
    #[arg(long, default_value = "xml")]
    pub extension: String,

    #[command(flatten)]
    pub run: RunArgs,
}

pub fn execute(args: CompareArgs) -> CliResult<Status> {
    let tolerance = args.run.tolerance()?;
    let expected = match &args.expected_changes {
        Some(path) => load_expected_changes(path)?,
        None => Vec::new(),
    };
    let extension = args.extension.trim_start_matches('.');
    let a = load_collection(&args.input_dir_a, extension)?;
    let b = load_collection(&args.input_dir_b, extension)?;
    let pool = WorkerPool::new(args.run.n_procs)?;

    let shared = a.names().intersection(&b.names()).count();
    info!(a = a.len(), b = b.len(), shared, threads = pool.threads(), "comparing collections");

    let pb = output::progress_bar(shared, args.run.quiet);
    pb.set_message("comparing");
    let comparer = BatchComparer::new(tolerance, expected);
    let report = comparer.run(&a, &b, &pool, |_| pb.inc(1));
    pb.finish_and_clear();

    save_model(&report, &args.output)?;

    output::print_list("Missing from collection A:", &report.missing_in_a);
    output::print_list("Missing from collection B:", &report.missing_in_b);
    for (name, item) in &report.divergent {
        output::print_error(&format!("{}: {} unexplained difference(s)", name, item.differences.len()));
    }
    for (name, error) in &report.errors {
        output::print_error(&format!("{}: {}", name, error));
    }
    for (name, warnings) in &report.warnings {
        for warning in warnings {
            output::print_warning(&format!("{}: {}", name, warning));
        }
    }
    output::print_info(&format!(
        "{} compared, {} identical, report written to {}",
        report.compared,
        report.identical,
        args.output.display()
    ));

    let status = Status::from_flags(
        report.has_divergence() || report.has_errors(),
        report.has_warnings(),
        args.run.warnings_as_errors,
    );
    if status == Status::Clean {
        output::print_success("collections match");
    }
    Ok(status)
}
