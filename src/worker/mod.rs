//! The worker pool.
//!
//! One worker per logical CPU. Each worker parses and type-checks the
//! target package independently (the tree is mutated in place during a
//! walk, so nothing tree-shaped is shared between workers), materializes a
//! snapshot of every source file into its own scratch directory, and then
//! drains operators from the shared queue. Each (operator, file) walk emits
//! one tally on the results channel.
//!
//! Cancellation is observed before dequeuing an operator and between
//! files; an in-flight test call is allowed to finish.

use crate::coverage::{blocks_for_file, Profile};
use crate::mutation::visitor::walk_file;
use crate::mutation::{GoTester, Operator, ParseInfo, Tally};
use crate::syntax::{self, printer};
use crate::types;
use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct Worker {
    /// Scratch package directory mutants are built and tested in.
    pub mutant_dir: PathBuf,
    /// Pristine printer snapshots, the diff and restore-check baseline.
    pub baseline_dir: PathBuf,
    /// The original package directory.
    pub package_dir: PathBuf,
    pub profiles: Arc<Vec<Profile>>,
    pub diff_only_invalid: bool,
    pub cancel: Arc<AtomicBool>,
    pub results: Sender<Tally>,
}

impl Worker {
    /// Parses, snapshots, and drains the operator queue. Returns when the
    /// queue closes or cancellation is observed.
    pub fn run(self, jobs: Receiver<Operator>) -> Result<()> {
        std::fs::create_dir_all(&self.mutant_dir)
            .with_context(|| format!("creating {}", self.mutant_dir.display()))?;
        std::fs::create_dir_all(&self.baseline_dir)
            .with_context(|| format!("creating {}", self.baseline_dir.display()))?;

        let (fset, mut files) = syntax::parse_dir(&self.package_dir)?;

        // Both `pkg` and `pkg_test` may live in the directory; the
        // production package is the one not named `*_test`. Its absence
        // after a green sanity check is a programmer error.
        let prod: Vec<usize> = (0..files.len())
            .filter(|&i| !files[i].pkg_name.ends_with("_test"))
            .collect();
        assert!(
            !prod.is_empty(),
            "no production package in {}",
            self.package_dir.display()
        );

        let prod_refs: Vec<&syntax::SourceFile> = prod.iter().map(|&i| &files[i]).collect();
        let type_infos: HashMap<usize, types::TypeInfo> = prod
            .iter()
            .copied()
            .zip(types::check_package(&prod_refs))
            .collect();

        // Snapshot every file (test files included) so each Test() call
        // only rewrites the file under mutation.
        let mut baselines: HashMap<usize, String> = HashMap::new();
        for (i, file) in files.iter().enumerate() {
            let text = printer::print_file(file);
            let name = file.base_name();
            std::fs::write(self.mutant_dir.join(&name), &text)
                .with_context(|| format!("writing snapshot {name}"))?;
            std::fs::write(self.baseline_dir.join(&name), &text)
                .with_context(|| format!("writing baseline {name}"))?;
            baselines.insert(i, text);
        }

        'queue: for op in jobs.iter() {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::debug!("worker cancelled before {op}");
                break;
            }
            for &i in &prod {
                if self.cancel.load(Ordering::SeqCst) {
                    tracing::debug!("worker cancelled during {op}");
                    break 'queue;
                }
                if files[i].is_test_file() {
                    continue;
                }
                let base_name = files[i].base_name();
                let pkg_name = files[i].pkg_name.clone();
                let blocks = blocks_for_file(&self.profiles, &files[i].path);
                let info = ParseInfo {
                    file_set: &fset,
                    covered_blocks: blocks,
                    types: &type_infos[&i],
                };
                let mut tester = GoTester::new(
                    &self.mutant_dir,
                    &self.baseline_dir,
                    base_name.clone(),
                    pkg_name,
                    self.diff_only_invalid,
                );

                walk_file(op, &info, &mut files[i].ast, &mut tester);

                // Every operator must leave the tree exactly as it found
                // it; anything else would poison all later walks.
                let restored = printer::print_file(&files[i]);
                assert!(
                    restored == baselines[&i],
                    "operator {op} failed to restore {base_name}"
                );
                std::fs::write(self.mutant_dir.join(&base_name), &restored)
                    .with_context(|| format!("restoring snapshot {base_name}"))?;

                let _ = self.results.send(tester.tally);
            }
        }
        Ok(())
    }
}

/// A queue pre-loaded with every selected operator, then closed. Workers
/// drain it; each operator runs on exactly one worker.
pub fn operator_queue(operators: &[Operator]) -> Receiver<Operator> {
    let (tx, rx) = crossbeam_channel::bounded(operators.len());
    for &op in operators {
        // Capacity equals the operator count; the sends cannot block.
        tx.send(op).expect("pre-loading operator queue");
    }
    rx
}
