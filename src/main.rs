mod config;
mod coverage;
mod mutation;
mod project;
mod syntax;
mod types;
mod worker;

use crate::config::RunConfig;
use crate::mutation::Tally;
use crate::worker::{operator_queue, Worker};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Kept in sync with the operator catalogue by a unit test.
const OPERATOR_HELP: &str = "\
Mutations:
    voidrm          Removes void function calls.
    swapifelse      Swaps the bodies of if/else statements.
    swapswitch      Swaps the bodies of adjacent switch cases.
    condbound       Adds or removes the equal sign in comparison operators.
    mathop          Swaps arithmetic and bitwise operators (eg. + to -).
    boolop          Changes && to || and vice versa.
    mathopassign    Same as mathop but for compound assignments.
    negcond         Swaps comparison operators with their inverse (eg. == to !=).
    floatcompinv    Inverts floating point comparisons, eg. `f0 == f1` to `!(f0 != f1)`.

Code that the initial coverage run never executes is not mutated. A mutant
that survives the test suite is printed as a unified diff.";

#[derive(Parser)]
#[command(name = "roentgen")]
#[command(version)]
#[command(about = "Mutation testing for Go packages")]
#[command(after_help = OPERATOR_HELP)]
struct Cli {
    /// Comma separated list of mutations to run (default: all)
    #[arg(long, value_delimiter = ',', value_name = "names")]
    mutations: Vec<String>,

    /// Debug flag: print diffs only for mutants whose build failed
    #[arg(long)]
    diff_only_invalid: bool,

    /// Import path of the package to mutate; defaults to the current
    /// directory, which must live under $GOPATH/src
    package: Option<String>,
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();
    let cfg = RunConfig::resolve(cli.package, &cli.mutations, cli.diff_only_invalid)?;

    project::sanity_check(&cfg)?;
    let profiles = Arc::new(project::coverage_profiles(&cfg)?);

    // Every worker gets its own scratch package under one temporary root,
    // removed when the run ends.
    let scratch_root = tempfile::tempdir().context("creating scratch directory")?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            tracing::info!("interrupt received, letting in-flight mutants finish");
            cancel.store(true, Ordering::SeqCst);
        })
        .context("installing signal handler")?;
    }

    let jobs = operator_queue(&cfg.operators);
    let (res_tx, res_rx) = crossbeam_channel::unbounded();

    std::thread::scope(|scope| {
        for n in 0..num_cpus::get() {
            let worker = Worker {
                mutant_dir: scratch_root.path().join(format!("mutant{n}")),
                baseline_dir: scratch_root.path().join(format!("baseline{n}")),
                package_dir: cfg.package_dir.clone(),
                profiles: profiles.clone(),
                diff_only_invalid: cfg.diff_only_invalid,
                cancel: cancel.clone(),
                results: res_tx.clone(),
            };
            let jobs = jobs.clone();
            scope.spawn(move || {
                if let Err(e) = worker.run(jobs) {
                    tracing::error!("worker: {e:#}");
                }
            });
        }
        drop(res_tx);
    });

    let tally: Tally = res_rx.iter().sum();
    println!("{}", format_report(&tally, start.elapsed()));
    Ok(())
}

/// The final score line. A run that generated no mutants scores 0.0%
/// rather than dividing by zero.
fn format_report(tally: &Tally, elapsed: Duration) -> String {
    let score = if tally.total == 0 {
        0.0
    } else {
        tally.killed() as f64 / tally.total as f64 * 100.0
    };
    format!(
        "score: {:.1}% ({} killed, {} alive, {} total, {} skipped) in {:.2?}",
        score,
        tally.killed(),
        tally.alive,
        tally.total,
        tally.skipped,
        elapsed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::Operator;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_default() {
        let cli = Cli::try_parse_from(["roentgen"]).unwrap();
        assert!(cli.mutations.is_empty());
        assert!(!cli.diff_only_invalid);
        assert!(cli.package.is_none());
    }

    #[test]
    fn test_cli_parse_package_arg() {
        let cli = Cli::try_parse_from(["roentgen", "example.com/pkg"]).unwrap();
        assert_eq!(cli.package.as_deref(), Some("example.com/pkg"));
    }

    #[test]
    fn test_cli_parse_mutations_csv() {
        let cli =
            Cli::try_parse_from(["roentgen", "--mutations", "mathop,swapifelse"]).unwrap();
        assert_eq!(cli.mutations, vec!["mathop", "swapifelse"]);
    }

    #[test]
    fn test_cli_parse_diff_only_invalid() {
        let cli = Cli::try_parse_from(["roentgen", "--diff-only-invalid"]).unwrap();
        assert!(cli.diff_only_invalid);
    }

    #[test]
    fn test_cli_validate() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_operator_help_lists_every_operator() {
        for op in Operator::ALL {
            assert!(
                OPERATOR_HELP.contains(op.short_name()),
                "help is missing {}",
                op.short_name()
            );
            assert!(
                OPERATOR_HELP.contains(op.description()),
                "help is missing the description of {}",
                op.short_name()
            );
        }
    }

    #[test]
    fn test_format_report() {
        let tally = Tally {
            alive: 2,
            total: 10,
            skipped: 1,
        };
        let line = format_report(&tally, Duration::from_millis(1500));
        assert!(line.starts_with("score: 80.0% (8 killed, 2 alive, 10 total, 1 skipped)"));
        assert!(line.contains("1.50s"));
    }

    #[test]
    fn test_format_report_zero_mutants() {
        let line = format_report(&Tally::default(), Duration::from_secs(1));
        assert!(line.starts_with("score: 0.0% (0 killed, 0 alive, 0 total, 0 skipped)"));
    }
}
