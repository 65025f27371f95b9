//! Pre-order traversal driving one operator over one file.
//!
//! The walk hands every node to the operator before descending. Child ids
//! are collected after the operator returns: operators restore the tree
//! before returning, so the lists read here are always the original ones
//! and a rewrite can never redirect the traversal.

use super::{Operator, ParseInfo, Tester};
use crate::syntax::ast::{Ast, Node};

/// Walks every declaration of the file in source order, applying the
/// operator at each node. The walk itself never stops early; the
/// operator's own gating decides where mutants are produced.
pub fn walk_file(op: Operator, info: &ParseInfo, ast: &mut Ast, tester: &mut dyn Tester) {
    let mut roots = Vec::new();
    ast.decl_children(&mut roots);
    for node in roots {
        walk(op, info, ast, node, tester);
    }
}

fn walk(op: Operator, info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    op.apply(info, ast, node, tester);
    let mut children = Vec::new();
    match node {
        Node::Expr(id) => ast.expr_children(id, &mut children),
        Node::Stmt(id) => ast.stmt_children(id, &mut children),
    }
    for child in children {
        walk(op, info, ast, child, tester);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::ProfileBlock;
    use crate::syntax::parser::parse_file;
    use crate::syntax::printer;
    use crate::syntax::{FileSet, SourceFile};
    use crate::types::{self, TypeInfo};
    use std::path::PathBuf;

    /// A tester that only counts invocations.
    struct NoopTester {
        calls: usize,
    }

    impl Tester for NoopTester {
        fn test(&mut self, _ast: &Ast) {
            self.calls += 1;
        }
    }

    fn full_coverage() -> Vec<ProfileBlock> {
        vec![ProfileBlock {
            start_line: 1,
            start_col: 1,
            end_line: 10_000,
            end_col: 1,
            num_stmt: 1,
            count: 1,
        }]
    }

    fn setup(src: &str) -> (FileSet, SourceFile, TypeInfo) {
        let mut fset = FileSet::new();
        let base = fset.add_file("a.go", src);
        let file = parse_file(&PathBuf::from("a.go"), src, base).expect("parse");
        let mut infos = types::check_package(&[&file]);
        let info = infos.remove(0);
        (fset, file, info)
    }

    const SOURCE: &str = "package a\n\nfunc abs(x int) int {\n\tif x > 0 {\n\t\treturn x\n\t} else {\n\t\treturn -x\n\t}\n}\n";

    #[test]
    fn test_walk_with_noop_tester_leaves_tree_unchanged() {
        for op in Operator::ALL {
            let (fset, mut file, tinfo) = setup(SOURCE);
            let before = printer::print_file(&file);
            let blocks = full_coverage();
            let info = ParseInfo {
                file_set: &fset,
                covered_blocks: &blocks,
                types: &tinfo,
            };
            let mut tester = NoopTester { calls: 0 };
            walk_file(op, &info, &mut file.ast, &mut tester);
            let after = printer::print_file(&file);
            assert_eq!(before, after, "{op} must restore the tree");
        }
    }

    #[test]
    fn test_uncovered_file_produces_no_mutants() {
        for op in Operator::ALL {
            let (fset, mut file, tinfo) = setup(SOURCE);
            let blocks: Vec<ProfileBlock> = Vec::new();
            let info = ParseInfo {
                file_set: &fset,
                covered_blocks: &blocks,
                types: &tinfo,
            };
            let mut tester = NoopTester { calls: 0 };
            walk_file(op, &info, &mut file.ast, &mut tester);
            assert_eq!(tester.calls, 0, "{op} must not mutate uncovered code");
        }
    }

    #[test]
    fn test_walk_is_deterministic() {
        let count_mutants = || {
            let (fset, mut file, tinfo) = setup(SOURCE);
            let blocks = full_coverage();
            let info = ParseInfo {
                file_set: &fset,
                covered_blocks: &blocks,
                types: &tinfo,
            };
            let mut total = 0;
            for op in Operator::ALL {
                let mut tester = NoopTester { calls: 0 };
                walk_file(op, &info, &mut file.ast, &mut tester);
                total += tester.calls;
            }
            total
        };
        assert_eq!(count_mutants(), count_mutants());
    }
}
