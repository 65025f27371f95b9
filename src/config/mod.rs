//! Run configuration: `$GOPATH` resolution, target package selection, and
//! operator choice.

use crate::mutation::Operator;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Everything a run needs to know, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Import path of the package under test, e.g. `example.com/pkg`.
    pub package: String,
    /// Filesystem path of the package: `$GOPATH/src/<package>`.
    pub package_dir: PathBuf,
    /// Operators to run, in catalogue order.
    pub operators: Vec<Operator>,
    pub diff_only_invalid: bool,
}

impl RunConfig {
    /// Resolves the run configuration. `package` falls back to the current
    /// working directory, which must then live under `$GOPATH/src`.
    pub fn resolve(
        package: Option<String>,
        mutations: &[String],
        diff_only_invalid: bool,
    ) -> Result<Self> {
        let gopath = PathBuf::from(
            std::env::var_os("GOPATH").context("$GOPATH not set")?,
        );
        let src_root = gopath.join("src");

        let package = match package {
            Some(pkg) => pkg,
            None => {
                let wd = std::env::current_dir().context("reading working directory")?;
                let rel = wd.strip_prefix(&src_root).map_err(|_| {
                    anyhow::anyhow!("no package given and not inside $GOPATH/src")
                })?;
                rel.to_string_lossy().into_owned()
            }
        };
        if package.is_empty() {
            bail!("no package given and not inside $GOPATH/src");
        }

        Ok(Self {
            package_dir: src_root.join(&package),
            package,
            operators: selected_operators(mutations)?,
            diff_only_invalid,
        })
    }
}

/// Maps `--mutations` short names to operators; an empty selection means
/// the full catalogue.
fn selected_operators(names: &[String]) -> Result<Vec<Operator>> {
    if names.is_empty() {
        return Ok(Operator::ALL.to_vec());
    }
    let mut operators = Vec::with_capacity(names.len());
    for name in names {
        let Some(op) = Operator::from_name(name) else {
            let known: Vec<&str> = Operator::ALL.iter().map(|o| o.short_name()).collect();
            bail!(
                "unknown mutation: {name} (available: {})",
                known.join(", ")
            );
        };
        operators.push(op);
    }
    Ok(operators)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_means_all() {
        let ops = selected_operators(&[]).unwrap();
        assert_eq!(ops, Operator::ALL.to_vec());
    }

    #[test]
    fn test_selection_by_short_name() {
        let ops = selected_operators(&strings(&["mathop", "swapifelse"])).unwrap();
        assert_eq!(ops, vec![Operator::Math, Operator::SwapIfElse]);
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err = selected_operators(&strings(&["mathops"])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown mutation: mathops"));
        assert!(msg.contains("mathop"));
        assert!(msg.contains("floatcompinv"));
    }

    // One test covers both GOPATH behaviors: tests run concurrently and
    // the environment is process-global.
    #[test]
    fn test_resolve_reads_gopath() {
        let saved = std::env::var_os("GOPATH");

        std::env::remove_var("GOPATH");
        let err = RunConfig::resolve(Some("example.com/p".into()), &[], false).unwrap_err();
        assert!(err.to_string().contains("$GOPATH not set"));

        std::env::set_var("GOPATH", "/home/u/go");
        let cfg = RunConfig::resolve(Some("example.com/p".into()), &[], true).unwrap();
        assert_eq!(cfg.package, "example.com/p");
        assert_eq!(
            cfg.package_dir,
            PathBuf::from("/home/u/go/src/example.com/p")
        );
        assert!(cfg.diff_only_invalid);
        assert_eq!(cfg.operators.len(), Operator::ALL.len());

        match saved {
            Some(saved) => std::env::set_var("GOPATH", saved),
            None => std::env::remove_var("GOPATH"),
        }
    }
}
