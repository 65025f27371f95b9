//! Coverage profiles.
//!
//! Parses the profile emitted by `go test -coverprofile` and answers the one
//! question the engine asks: does a source position fall inside a block that
//! executed at least once. Blocks with a zero count are dropped at parse
//! time; the containment check still guards on the count so a hand-built
//! block list behaves the same way.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// One `file:start,end numStmt count` line of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileBlock {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_stmt: u32,
    pub count: u32,
}

/// All blocks recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Import-path-qualified file name, e.g. `example.com/pkg/a.go`.
    pub file_name: String,
    pub blocks: Vec<ProfileBlock>,
}

/// Parses a coverage profile, keeping only blocks with a non-zero count.
pub fn parse_profiles(text: &str) -> Result<Vec<Profile>> {
    let mut profiles: Vec<Profile> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if lineno == 0 && line.starts_with("mode:") {
            continue;
        }
        let (file_name, rest) = line
            .rsplit_once(':')
            .with_context(|| format!("coverage profile line {}: missing ':'", lineno + 1))?;
        let block = parse_block(rest)
            .with_context(|| format!("coverage profile line {}", lineno + 1))?;
        if block.count == 0 {
            continue;
        }
        match profiles.iter_mut().find(|p| p.file_name == file_name) {
            Some(profile) => profile.blocks.push(block),
            None => profiles.push(Profile {
                file_name: file_name.to_string(),
                blocks: vec![block],
            }),
        }
    }
    Ok(profiles)
}

/// Parses `SL.SC,EL.EC numStmt count`.
fn parse_block(s: &str) -> Result<ProfileBlock> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    if fields.len() != 3 {
        bail!("expected 3 fields, got {}", fields.len());
    }
    let (start, end) = fields[0]
        .split_once(',')
        .context("missing ',' in block range")?;
    let (sl, sc) = parse_pos(start)?;
    let (el, ec) = parse_pos(end)?;
    Ok(ProfileBlock {
        start_line: sl,
        start_col: sc,
        end_line: el,
        end_col: ec,
        num_stmt: fields[1].parse().context("bad statement count")?,
        count: fields[2].parse().context("bad execution count")?,
    })
}

fn parse_pos(s: &str) -> Result<(u32, u32)> {
    let (line, col) = s.split_once('.').context("missing '.' in position")?;
    Ok((
        line.parse().context("bad line number")?,
        col.parse().context("bad column number")?,
    ))
}

/// Selects the block list for a parsed file by suffix match: the profile
/// names files by import path, the parser by filesystem path.
pub fn blocks_for_file<'a>(profiles: &'a [Profile], path: &Path) -> &'a [ProfileBlock] {
    let path = path.to_string_lossy();
    profiles
        .iter()
        .find(|p| path.ends_with(&p.file_name))
        .map(|p| p.blocks.as_slice())
        .unwrap_or(&[])
}

/// True when a 1-based `line:column` position falls inside `block`.
pub fn block_contains(block: &ProfileBlock, line: u32, col: u32) -> bool {
    block.count > 0
        && (block.start_line < line || (block.start_line == line && col >= block.start_col))
        && (block.end_line > line || (block.end_line == line && col <= block.end_col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SAMPLE: &str = "mode: set\n\
        example.com/pkg/a.go:5.13,8.3 2 1\n\
        example.com/pkg/a.go:10.2,12.3 1 0\n\
        example.com/pkg/b.go:3.1,4.2 1 7\n";

    #[test]
    fn test_parse_drops_uncovered_blocks() {
        let profiles = parse_profiles(SAMPLE).unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].file_name, "example.com/pkg/a.go");
        assert_eq!(profiles[0].blocks.len(), 1);
        assert_eq!(profiles[0].blocks[0].count, 1);
        assert_eq!(profiles[1].blocks[0].count, 7);
    }

    #[test]
    fn test_parse_block_fields() {
        let profiles = parse_profiles("mode: atomic\nx/y.go:1.2,3.44 5 6\n").unwrap();
        let b = &profiles[0].blocks[0];
        assert_eq!(
            b,
            &ProfileBlock {
                start_line: 1,
                start_col: 2,
                end_line: 3,
                end_col: 44,
                num_stmt: 5,
                count: 6,
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_profiles("mode: set\nnot a block\n").is_err());
        assert!(parse_profiles("mode: set\nx.go:1.2,3 1 1\n").is_err());
    }

    #[test]
    fn test_blocks_for_file_suffix_match() {
        let profiles = parse_profiles(SAMPLE).unwrap();
        let blocks = blocks_for_file(&profiles, &PathBuf::from("/home/u/go/src/example.com/pkg/a.go"));
        assert_eq!(blocks.len(), 1);
        let none = blocks_for_file(&profiles, &PathBuf::from("/somewhere/c.go"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_block_contains_boundaries() {
        let b = ProfileBlock {
            start_line: 5,
            start_col: 13,
            end_line: 8,
            end_col: 3,
            num_stmt: 2,
            count: 1,
        };
        assert!(block_contains(&b, 6, 1));
        assert!(block_contains(&b, 5, 13));
        assert!(!block_contains(&b, 5, 12));
        assert!(block_contains(&b, 8, 3));
        assert!(!block_contains(&b, 8, 4));
        assert!(!block_contains(&b, 4, 40));
        assert!(!block_contains(&b, 9, 1));
    }

    #[test]
    fn test_zero_count_block_never_contains() {
        let b = ProfileBlock {
            start_line: 1,
            start_col: 1,
            end_line: 100,
            end_col: 100,
            num_stmt: 1,
            count: 0,
        };
        assert!(!block_contains(&b, 50, 50));
    }
}
