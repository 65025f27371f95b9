//! Go source frontend: lexer, parser, arena AST, printer, positions.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod pos;
pub mod printer;
pub mod token;

pub use ast::{Ast, Node, SourceFile};
pub use pos::{FileSet, Pos, Position};

use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Parses every `.go` file in `dir` (non-recursive, matching the host
/// toolchain's one-package-per-directory rule), in stable name order.
///
/// The sanity check has already proven the package compiles, so a parse
/// failure here is surfaced as a hard error: either the package uses a
/// construct outside the supported grammar, or a mutation failed to restore
/// the tree it ran on.
pub fn parse_dir(dir: &Path) -> Result<(FileSet, Vec<SourceFile>)> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading package directory {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "go") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut fset = FileSet::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let src = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let base = fset.add_file(&path.display().to_string(), &src);
        let file = parser::parse_file(&path, &src, base)
            .map_err(|e| anyhow!("{}: {}", fset.position(e.pos), e))?;
        files.push(file);
    }
    Ok((fset, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_dir_orders_and_skips_non_go() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.go"), "package p\n").unwrap();
        fs::write(dir.path().join("a.go"), "package p\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not go").unwrap();

        let (_, files) = parse_dir(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].path.ends_with("a.go"));
        assert!(files[1].path.ends_with("b.go"));
    }

    #[test]
    fn test_parse_dir_reports_file_position() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "package p\n\nfunc f() {\n\t@\n}\n").unwrap();
        let err = parse_dir(dir.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a.go:4:"), "got: {msg}");
    }
}
