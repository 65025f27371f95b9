//! Source positions.
//!
//! Positions are flat `u32` offsets into a [`FileSet`], which owns one entry
//! per parsed file and translates an offset back to `file:line:column`. This
//! mirrors the host toolchain's position handling: every node stores one
//! compact offset and the set resolves it on demand (coverage gating is the
//! only hot consumer).

use std::fmt;

/// A compact source offset. `NO_POS` marks synthesized nodes.
pub type Pos = u32;

/// Reserved offset for nodes that have no source location.
pub const NO_POS: Pos = 0;

/// A resolved source location, 1-based line and byte column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug)]
struct FileMap {
    name: String,
    /// First offset assigned to this file. Bases start at 1 so that
    /// `NO_POS` never resolves.
    base: u32,
    size: u32,
    /// Byte offset (relative to the file start) of each line start.
    line_starts: Vec<u32>,
}

/// Owns the offset space of every file parsed in one run.
#[derive(Default, Debug)]
pub struct FileSet {
    files: Vec<FileMap>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file and returns the base offset its tokens start at.
    pub fn add_file(&mut self, name: &str, src: &str) -> Pos {
        let base = self
            .files
            .last()
            .map(|f| f.base + f.size + 1)
            .unwrap_or(1);
        let mut line_starts = vec![0u32];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        self.files.push(FileMap {
            name: name.to_string(),
            base,
            size: src.len() as u32,
            line_starts,
        });
        base
    }

    fn lookup(&self, pos: Pos) -> Option<&FileMap> {
        self.files
            .iter()
            .find(|f| pos >= f.base && pos <= f.base + f.size)
    }

    /// Resolves an offset to a `file:line:column` location.
    ///
    /// Offsets outside every registered file (including `NO_POS`) resolve to
    /// an anonymous zero position rather than panicking; synthesized nodes
    /// are never position-checked on the hot path but may still be printed
    /// in diagnostics.
    pub fn position(&self, pos: Pos) -> Position {
        let Some(file) = self.lookup(pos) else {
            return Position {
                file: String::new(),
                line: 0,
                column: 0,
            };
        };
        let rel = pos - file.base;
        let line_idx = match file.line_starts.binary_search(&rel) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            file: file.name.clone(),
            line: line_idx as u32 + 1,
            column: rel - file.line_starts[line_idx] + 1,
        }
    }

    /// Name of the file containing `pos`, if any.
    pub fn file_name(&self, pos: Pos) -> Option<&str> {
        self.lookup(pos).map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_resolution() {
        let mut fset = FileSet::new();
        let base = fset.add_file("a.go", "package a\n\nvar x = 1\n");
        assert_eq!(base, 1);

        let p = fset.position(base);
        assert_eq!(p.file, "a.go");
        assert_eq!(p.line, 1);
        assert_eq!(p.column, 1);

        // "var" starts at byte 11: line 3, column 1.
        let p = fset.position(base + 11);
        assert_eq!(p.line, 3);
        assert_eq!(p.column, 1);

        // "x" at byte 15: line 3, column 5.
        let p = fset.position(base + 15);
        assert_eq!(p.line, 3);
        assert_eq!(p.column, 5);
    }

    #[test]
    fn test_two_files_disjoint_bases() {
        let mut fset = FileSet::new();
        let a = fset.add_file("a.go", "package a\n");
        let b = fset.add_file("b.go", "package a\n");
        assert!(b > a);
        assert_eq!(fset.position(a).file, "a.go");
        assert_eq!(fset.position(b).file, "b.go");
        assert_eq!(fset.position(b).line, 1);
    }

    #[test]
    fn test_no_pos_resolves_to_zero() {
        let mut fset = FileSet::new();
        fset.add_file("a.go", "package a\n");
        let p = fset.position(NO_POS);
        assert_eq!(p.line, 0);
        assert!(p.file.is_empty());
    }

    #[test]
    fn test_display() {
        let mut fset = FileSet::new();
        let base = fset.add_file("a.go", "package a\n");
        assert_eq!(fset.position(base).to_string(), "a.go:1:1");
    }
}
