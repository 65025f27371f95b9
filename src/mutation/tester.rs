//! The production tester: materialize the mutated file, build, test,
//! classify.
//!
//! The worker pre-populates the scratch directory with a snapshot of every
//! source file, so each `test` call only rewrites the one file under
//! mutation. A failed build means the operator produced an invalid tree:
//! the mutant is counted as skipped and never runs tests. A failed test run
//! kills the mutant; a passing one leaves it alive and prints the diff.
//!
//! Every `test` call lands in exactly one counter: a mutant that could not
//! be written, built, or handed to the test runner counts as skipped, so
//! `killed + alive + skipped` always equals the number of invocations.

use super::{Tally, Tester};
use crate::syntax::ast::Ast;
use crate::syntax::printer;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub struct GoTester {
    /// Scratch package the mutant is built and tested in.
    mutant_dir: PathBuf,
    /// Pristine snapshots, for diffing surviving mutants.
    baseline_dir: PathBuf,
    /// Base name of the file under mutation.
    file_name: String,
    /// Package clause to serialize under.
    pkg_name: String,
    diff_only_invalid: bool,
    pub tally: Tally,
}

impl GoTester {
    pub fn new(
        mutant_dir: &Path,
        baseline_dir: &Path,
        file_name: String,
        pkg_name: String,
        diff_only_invalid: bool,
    ) -> Self {
        Self {
            mutant_dir: mutant_dir.to_path_buf(),
            baseline_dir: baseline_dir.to_path_buf(),
            file_name,
            pkg_name,
            diff_only_invalid,
            tally: Tally::default(),
        }
    }

    /// Prints a unified diff of the mutant against its baseline snapshot to
    /// stdout. Presentation only; never touches the counters.
    fn print_diff(&self) {
        let result = Command::new("diff")
            .arg("-u")
            .arg(self.baseline_dir.join(&self.file_name))
            .arg(self.mutant_dir.join(&self.file_name))
            .status();
        if let Err(e) = result {
            tracing::warn!("running diff: {e}");
        }
    }
}

impl Tester for GoTester {
    fn test(&mut self, ast: &Ast) {
        let path = self.mutant_dir.join(&self.file_name);
        let src = printer::print(&self.pkg_name, ast);
        if let Err(e) = std::fs::write(&path, src) {
            // The mutant never materialized, so no test can run.
            self.tally.skipped += 1;
            tracing::warn!("writing mutant {}: {e}", path.display());
            return;
        }

        match run_silent("go", &["build"], &self.mutant_dir) {
            Ok(true) => {}
            Ok(false) => {
                // The operator produced a tree that does not compile.
                self.tally.skipped += 1;
                tracing::warn!("invalid build: {}", self.file_name);
                if self.diff_only_invalid {
                    self.print_diff();
                }
                return;
            }
            Err(e) => {
                // The compiler never ran; same outcome as an invalid build.
                self.tally.skipped += 1;
                tracing::warn!("running go build: {e}");
                if self.diff_only_invalid {
                    self.print_diff();
                }
                return;
            }
        }

        match run_silent("go", &["test", "-short"], &self.mutant_dir) {
            Ok(passed) => {
                self.tally.total += 1;
                if !passed {
                    // Non-zero exit from the test runner: the mutant is
                    // killed.
                    return;
                }
            }
            Err(e) => {
                // The runner never produced an exit code; counting the
                // mutant in `total` would report it as killed.
                self.tally.skipped += 1;
                tracing::warn!("running go test: {e}");
                return;
            }
        }

        self.tally.alive += 1;
        if !self.diff_only_invalid {
            self.print_diff();
        }
    }
}

/// Runs a command with suppressed output; true means exit code zero.
fn run_silent(program: &str, args: &[&str], dir: &Path) -> std::io::Result<bool> {
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_with_zeroed_tally() {
        let tester = GoTester::new(
            Path::new("/tmp/mutant"),
            Path::new("/tmp/baseline"),
            "a.go".to_string(),
            "a".to_string(),
            false,
        );
        assert_eq!(tester.tally, Tally::default());
        assert_eq!(tester.tally.killed(), 0);
    }

    #[test]
    fn test_unwritable_scratch_counts_skipped() {
        let mut tester = GoTester::new(
            Path::new("/nonexistent-roentgen-scratch"),
            Path::new("/nonexistent-roentgen-baseline"),
            "a.go".to_string(),
            "a".to_string(),
            false,
        );
        let ast = Ast::new();
        tester.test(&ast);
        // The invocation must still be accounted for, and only as skipped.
        assert_eq!(tester.tally.skipped, 1);
        assert_eq!(tester.tally.total, 0);
        assert_eq!(tester.tally.alive, 0);
        assert_eq!(tester.tally.killed(), 0);

        tester.test(&ast);
        assert_eq!(tester.tally.skipped, 2);
    }
}
