//! The mutation engine: operator catalogue, equivalence-avoidance
//! predicates, coverage gating, and the tester contract.
//!
//! An operator is a local, reversible rewrite: inspect a node, apply one
//! mutation, hand the tree to the tester, put the original back. The
//! catalogue is a closed enum so the CLI can dispatch operators by their
//! stable short names.

pub mod operators;
pub mod tester;
pub mod visitor;

pub use tester::GoTester;

use crate::coverage::{block_contains, ProfileBlock};
use crate::syntax::ast::{Ast, Expr, ExprId, Node};
use crate::syntax::pos::FileSet;
use crate::syntax::token::LitKind;
use crate::types::TypeInfo;
use regex::Regex;
use std::sync::LazyLock;

/// Immutable context shared by all operators during one walk.
pub struct ParseInfo<'a> {
    pub file_set: &'a FileSet,
    /// Blocks of the file under mutation, pre-filtered to `count > 0`.
    pub covered_blocks: &'a [ProfileBlock],
    /// Type facts of the file under mutation.
    pub types: &'a TypeInfo,
}

/// Runs the tests against the currently mutated tree. The one production
/// implementor compiles and tests a serialized snapshot; tests substitute
/// recording doubles.
pub trait Tester {
    fn test(&mut self, ast: &Ast);
}

/// Counters accumulated over one visitor run (and summed for the report).
/// `total` counts mutants that compiled and ran; `skipped` counts mutants
/// whose build failed and therefore never ran. Killed is `total - alive`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub alive: u64,
    pub total: u64,
    pub skipped: u64,
}

impl Tally {
    pub fn killed(&self) -> u64 {
        self.total - self.alive
    }

    pub fn merge(&mut self, other: Tally) {
        self.alive += other.alive;
        self.total += other.total;
        self.skipped += other.skipped;
    }
}

impl std::iter::Sum for Tally {
    fn sum<I: Iterator<Item = Tally>>(iter: I) -> Tally {
        let mut acc = Tally::default();
        for t in iter {
            acc.merge(t);
        }
        acc
    }
}

/// The operator catalogue. Short names are stable CLI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    VoidCallRemover,
    SwapIfElse,
    SwapSwitchCase,
    ConditionalsBoundary,
    Math,
    Boolean,
    MathAssign,
    NegateConditionals,
    FloatComparisonInverter,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::VoidCallRemover,
        Operator::SwapIfElse,
        Operator::SwapSwitchCase,
        Operator::ConditionalsBoundary,
        Operator::Math,
        Operator::Boolean,
        Operator::MathAssign,
        Operator::NegateConditionals,
        Operator::FloatComparisonInverter,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            Operator::VoidCallRemover => "voidrm",
            Operator::SwapIfElse => "swapifelse",
            Operator::SwapSwitchCase => "swapswitch",
            Operator::ConditionalsBoundary => "condbound",
            Operator::Math => "mathop",
            Operator::Boolean => "boolop",
            Operator::MathAssign => "mathopassign",
            Operator::NegateConditionals => "negcond",
            Operator::FloatComparisonInverter => "floatcompinv",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operator::VoidCallRemover => "Removes void function calls.",
            Operator::SwapIfElse => "Swaps the bodies of if/else statements.",
            Operator::SwapSwitchCase => "Swaps the bodies of adjacent switch cases.",
            Operator::ConditionalsBoundary => {
                "Adds or removes the equal sign in comparison operators."
            }
            Operator::Math => "Swaps arithmetic and bitwise operators (eg. + to -).",
            Operator::Boolean => "Changes && to || and vice versa.",
            Operator::MathAssign => "Same as mathop but for compound assignments.",
            Operator::NegateConditionals => {
                "Swaps comparison operators with their inverse (eg. == to !=)."
            }
            Operator::FloatComparisonInverter => {
                "Inverts floating point comparisons, eg. `f0 == f1` to `!(f0 != f1)`."
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.short_name() == name)
    }

    /// Applies this operator at one node: gate, mutate, test, restore.
    pub fn apply(self, info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
        match self {
            Operator::VoidCallRemover => operators::void_call_remover(info, ast, node, tester),
            Operator::SwapIfElse => operators::swap_if_else(info, ast, node, tester),
            Operator::SwapSwitchCase => operators::swap_switch_case(info, ast, node, tester),
            Operator::ConditionalsBoundary => {
                operators::conditionals_boundary(info, ast, node, tester)
            }
            Operator::Math => operators::math(info, ast, node, tester),
            Operator::Boolean => operators::boolean(info, ast, node, tester),
            Operator::MathAssign => operators::math_assign(info, ast, node, tester),
            Operator::NegateConditionals => {
                operators::negate_conditionals(info, ast, node, tester)
            }
            Operator::FloatComparisonInverter => {
                operators::float_comparison_inverter(info, ast, node, tester)
            }
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Coverage gate: true when the node's start position lies inside a block
/// the initial test run executed. Uncovered code produces no mutants —
/// coverage output already tells the user what is not tested.
pub fn covered(info: &ParseInfo, ast: &Ast, node: Node) -> bool {
    let pos = info.file_set.position(ast.node_pos(node));
    info.covered_blocks
        .iter()
        .any(|b| block_contains(b, pos.line, pos.column))
}

static ZERO_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0+(\.0*)?|\.0+)$").expect("zero literal pattern"));

static ONE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^1(\.0+)?$").expect("one literal pattern"));

/// True for an INT or FLOAT literal spelling zero (`0`, `00`, `0.`, `0.0`,
/// `.0`).
pub fn is_zero(ast: &Ast, id: ExprId) -> bool {
    numeric_literal_matches(ast, id, &ZERO_LITERAL)
}

/// True for an INT or FLOAT literal spelling one (`1`, `1.0`).
pub fn is_one(ast: &Ast, id: ExprId) -> bool {
    numeric_literal_matches(ast, id, &ONE_LITERAL)
}

fn numeric_literal_matches(ast: &Ast, id: ExprId, re: &Regex) -> bool {
    match ast.expr(id) {
        Expr::Lit {
            kind: LitKind::Int | LitKind::Float,
            text,
        } => re.is_match(text),
        _ => false,
    }
}

/// True when the expression's deduced type is the primitive string type,
/// typed or untyped.
pub fn is_string(info: &ParseInfo, id: ExprId) -> bool {
    info.types
        .get(id)
        .and_then(|f| f.typ.basic())
        .is_some_and(|k| k.is_string())
}

/// True when the expression's deduced type is the primitive bool type,
/// typed or untyped.
pub fn is_bool(info: &ParseInfo, id: ExprId) -> bool {
    info.types
        .get(id)
        .and_then(|f| f.typ.basic())
        .is_some_and(|k| k.is_bool())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::pos::NO_POS;

    fn lit(ast: &mut Ast, kind: LitKind, text: &str) -> ExprId {
        ast.alloc_expr(
            Expr::Lit {
                kind,
                text: text.to_string(),
            },
            NO_POS,
        )
    }

    #[test]
    fn test_is_zero_forms() {
        let mut ast = Ast::new();
        for text in ["0", "00", "000", "0.", "0.0", "0.000", ".0", ".000"] {
            let id = lit(&mut ast, LitKind::Float, text);
            assert!(is_zero(&ast, id), "{text} should read as zero");
        }
        for text in ["1", "0x0", "0.1", ".01", "10", "0e0", "", "0x1F"] {
            let id = lit(&mut ast, LitKind::Int, text);
            assert!(!is_zero(&ast, id), "{text} should not read as zero");
        }
    }

    #[test]
    fn test_is_zero_requires_numeric_literal() {
        let mut ast = Ast::new();
        let s = lit(&mut ast, LitKind::String, "\"0\"");
        assert!(!is_zero(&ast, s));
        let ident = ast.alloc_expr(Expr::Ident("zero".into()), NO_POS);
        assert!(!is_zero(&ast, ident));
    }

    #[test]
    fn test_is_one_forms() {
        let mut ast = Ast::new();
        for text in ["1", "1.0", "1.00"] {
            let id = lit(&mut ast, LitKind::Float, text);
            assert!(is_one(&ast, id), "{text} should read as one");
        }
        for text in ["1.", "01", "10", "1.01", "2"] {
            let id = lit(&mut ast, LitKind::Int, text);
            assert!(!is_one(&ast, id), "{text} should not read as one");
        }
    }

    #[test]
    fn test_tally_sum_and_killed() {
        let a = Tally {
            alive: 1,
            total: 4,
            skipped: 0,
        };
        let b = Tally {
            alive: 0,
            total: 2,
            skipped: 3,
        };
        let sum: Tally = [a, b].into_iter().sum();
        assert_eq!(sum.alive, 1);
        assert_eq!(sum.total, 6);
        assert_eq!(sum.skipped, 3);
        assert_eq!(sum.killed(), 5);
    }

    #[test]
    fn test_operator_names_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.short_name()), Some(op));
            assert!(!op.description().is_empty());
        }
        assert_eq!(Operator::from_name("nope"), None);
    }

    #[test]
    fn test_operator_short_names_are_stable() {
        let names: Vec<&str> = Operator::ALL.iter().map(|o| o.short_name()).collect();
        assert_eq!(
            names,
            vec![
                "voidrm",
                "swapifelse",
                "swapswitch",
                "condbound",
                "mathop",
                "boolop",
                "mathopassign",
                "negcond",
                "floatcompinv",
            ]
        );
    }
}
