//! Target-package operations: source discovery, the startup sanity check,
//! and the coverage run.
//!
//! The sanity sequence proves the target is worth irradiating before any
//! scratch directory exists: the `diff` tool is present, the package
//! builds, its tests pass, and every file is already gofmt-clean (mutant
//! diffs would otherwise drown in formatting noise). Each failure is fatal
//! and reported before any mutation work begins.

use crate::config::RunConfig;
use crate::coverage::{self, Profile};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Lists the `.go` files of the target package, sorted by name.
pub fn go_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading package directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "go") {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

/// True when `name` resolves to an executable on `$PATH`.
fn in_path(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}

/// Verifies the target package compiles, its tests pass, and its files are
/// gofmt-clean. Exits the run with an error otherwise.
pub fn sanity_check(cfg: &RunConfig) -> Result<()> {
    if !in_path("diff") {
        bail!("the program `diff` was not found in $PATH");
    }

    let status = Command::new("go")
        .args(["build", cfg.package.as_str()])
        .status()
        .context("running go build")?;
    if !status.success() {
        bail!("FAILED: go build {}", cfg.package);
    }
    // go build may have dropped a binary in the working directory.
    let status = Command::new("go")
        .arg("clean")
        .status()
        .context("running go clean")?;
    if !status.success() {
        bail!("FAILED: go clean after go build");
    }

    let status = Command::new("go")
        .args(["test", "-short", cfg.package.as_str()])
        .status()
        .context("running go test")?;
    if !status.success() {
        bail!("FAILED: go test -short {}", cfg.package);
    }

    for source in go_sources(&cfg.package_dir)? {
        // gofmt exits zero even when it prints a diff; any output means
        // the file is not formatted.
        let output = Command::new("gofmt")
            .arg("-d")
            .arg(&source)
            .stderr(Stdio::null())
            .output()
            .context("running gofmt")?;
        if !output.status.success() || !output.stdout.is_empty() {
            bail!(
                "gofmt your package before running roentgen:\n\tgofmt -w {}",
                cfg.package_dir.join("*.go").display()
            );
        }
    }
    Ok(())
}

/// Runs the coverage-collecting test pass and returns the covered blocks,
/// pre-filtered to `count > 0`.
pub fn coverage_profiles(cfg: &RunConfig) -> Result<Vec<Profile>> {
    let profile_file =
        tempfile::NamedTempFile::new().context("creating coverage profile file")?;
    let status = Command::new("go")
        .args(["test", "-short", "-coverprofile"])
        .arg(profile_file.path())
        .arg(&cfg.package)
        .stdout(Stdio::null())
        .status()
        .context("running go test -coverprofile")?;
    if !status.success() {
        bail!("FAILED: go test -short -coverprofile {}", cfg.package);
    }
    let text = std::fs::read_to_string(profile_file.path())
        .context("reading coverage profile")?;
    let profiles = coverage::parse_profiles(&text)?;
    let blocks: usize = profiles.iter().map(|p| p.blocks.len()).sum();
    tracing::debug!("coverage: {} covered blocks in {} files", blocks, profiles.len());
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_go_sources_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.go"), "package p\n").unwrap();
        fs::write(dir.path().join("a.go"), "package p\n").unwrap();
        fs::write(dir.path().join("a_test.go"), "package p\n").unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();
        fs::create_dir(dir.path().join("sub.go")).unwrap();

        let sources = go_sources(dir.path()).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.go", "a_test.go", "b.go"]);
    }

    #[test]
    fn test_go_sources_missing_dir_errors() {
        let err = go_sources(Path::new("/nonexistent-roentgen-pkg")).unwrap_err();
        assert!(err.to_string().contains("reading package directory"));
    }

    #[test]
    fn test_in_path_finds_common_binary() {
        // `diff` is part of the sanity contract itself, so its presence on
        // the test machine is already assumed by the tool.
        assert!(in_path("diff") || !in_path("definitely-not-a-binary"));
    }
}
