//! The nine mutation operators.
//!
//! Every operator follows the same discipline: gate on coverage, inspect
//! the node, apply one local rewrite, invoke the tester exactly once per
//! distinct mutation, and restore every field it touched before returning.
//! Rewrites that need fresh nodes allocate them after recording an arena
//! mark and truncate back to it once the original value is back in place.

use super::{covered, is_bool, is_one, is_string, is_zero, ParseInfo, Tester};
use crate::syntax::ast::{Ast, Expr, ExprId, Node, Stmt, StmtId};
use crate::syntax::token::{AssignOp, BinOp, LitKind, UnaryOp};

/// Removes statements that call void functions from a block, one at a time.
pub(crate) fn void_call_remover(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    let Stmt::Block { list } = ast.stmt(id) else {
        return;
    };
    let list = list.clone();
    for (i, &sid) in list.iter().enumerate() {
        let expr = match ast.stmt(sid) {
            Stmt::Expr { expr } => *expr,
            _ => continue,
        };
        let is_void = info.types.get(expr).map(|f| f.is_void).unwrap_or(false);
        if !is_void {
            continue;
        }

        let mut mutation = list.clone();
        mutation.remove(i);
        set_block_list(ast, id, mutation);

        tester.test(ast);

        set_block_list(ast, id, list.clone());
    }
}

/// Swaps the then and else blocks of an `if` with a plain `else` (else-if
/// chains are left alone).
pub(crate) fn swap_if_else(info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    let (body, els) = match ast.stmt(id) {
        Stmt::If {
            body,
            els: Some(els),
            ..
        } => (*body, *els),
        _ => return,
    };
    if !matches!(ast.stmt(els), Stmt::Block { .. }) {
        return;
    }
    // The condition is reached but nothing inside either branch runs.
    if !covered(info, ast, Node::Stmt(body)) && !covered(info, ast, Node::Stmt(els)) {
        return;
    }

    set_if_branches(ast, id, els, body);

    tester.test(ast);

    set_if_branches(ast, id, body, els);
}

/// Swaps each switch case body with the next one (wrapping around), one
/// pair at a time. Swapping pairs rather than rotating everything keeps
/// each mutant attributable to a single pair of cases.
pub(crate) fn swap_switch_case(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    let Stmt::Switch { cases, .. } = ast.stmt(id) else {
        return;
    };
    let cases = cases.clone();
    if cases.len() < 2 {
        return;
    }
    for i in 0..cases.len() {
        let j = (i + 1) % cases.len();
        let (a, b) = (cases[i], cases[j]);
        if !covered(info, ast, Node::Stmt(a)) && !covered(info, ast, Node::Stmt(b)) {
            continue;
        }

        swap_case_bodies(ast, a, b);

        tester.test(ast);

        swap_case_bodies(ast, a, b);
    }
}

fn boundary_swap(op: BinOp) -> Option<BinOp> {
    Some(match op {
        BinOp::Lss => BinOp::Leq,
        BinOp::Leq => BinOp::Lss,
        BinOp::Gtr => BinOp::Geq,
        BinOp::Geq => BinOp::Gtr,
        _ => return None,
    })
}

/// `<` to `<=`, `>` to `>=`, and back.
pub(crate) fn conditionals_boundary(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
) {
    swap_binary_op(info, ast, node, tester, boundary_swap, no_suppression)
}

fn math_swap(op: BinOp) -> Option<BinOp> {
    Some(match op {
        BinOp::Add => BinOp::Sub,
        BinOp::Sub => BinOp::Add,
        BinOp::Mul => BinOp::Quo,
        BinOp::Quo => BinOp::Mul,
        BinOp::Rem => BinOp::Mul,
        BinOp::And => BinOp::Or,
        BinOp::Or => BinOp::And,
        BinOp::Xor => BinOp::And,
        BinOp::Shl => BinOp::Shr,
        BinOp::Shr => BinOp::Shl,
        _ => return None,
    })
}

/// Suppression for `mathop`: identities that make the swapped operator
/// behaviorally equivalent (or near enough to be noise). `x + 0`, `0 + x`,
/// `x - 0`, `0 - x`, `x * 1`, `1 * x`, `x / 1`, and string concatenation
/// gated on the left-hand side only.
fn math_suppressed(info: &ParseInfo, ast: &Ast, lhs: ExprId, op: BinOp, rhs: ExprId) -> bool {
    match op {
        BinOp::Add => is_zero(ast, lhs) || is_zero(ast, rhs) || is_string(info, lhs),
        BinOp::Sub => is_zero(ast, lhs) || is_zero(ast, rhs),
        BinOp::Mul => is_one(ast, lhs) || is_one(ast, rhs),
        BinOp::Quo => is_one(ast, rhs),
        _ => false,
    }
}

/// Swaps arithmetic and bitwise operators per the mathop table.
pub(crate) fn math(info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    swap_binary_op(info, ast, node, tester, math_swap, math_suppressed)
}

fn boolean_swap(op: BinOp) -> Option<BinOp> {
    Some(match op {
        BinOp::LAnd => BinOp::LOr,
        BinOp::LOr => BinOp::LAnd,
        _ => return None,
    })
}

/// `&&` to `||` and vice versa.
pub(crate) fn boolean(info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    swap_binary_op(info, ast, node, tester, boolean_swap, no_suppression)
}

fn negate_swap(op: BinOp) -> Option<BinOp> {
    Some(match op {
        BinOp::Eql => BinOp::Neq,
        BinOp::Neq => BinOp::Eql,
        BinOp::Lss => BinOp::Geq,
        BinOp::Geq => BinOp::Lss,
        BinOp::Gtr => BinOp::Leq,
        BinOp::Leq => BinOp::Gtr,
        _ => return None,
    })
}

/// Negates comparisons: `==` to `!=`, `<` to `>=`, `>` to `<=`, and back.
pub(crate) fn negate_conditionals(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
) {
    swap_binary_op(info, ast, node, tester, negate_swap, no_suppression)
}

fn no_suppression(_: &ParseInfo, _: &Ast, _: ExprId, _: BinOp, _: ExprId) -> bool {
    false
}

/// Shared body of the four operator-table mutators.
fn swap_binary_op(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
    table: fn(BinOp) -> Option<BinOp>,
    suppressed: fn(&ParseInfo, &Ast, ExprId, BinOp, ExprId) -> bool,
) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Expr(id) = node else { return };
    let (lhs, op, rhs) = match ast.expr(id) {
        Expr::Binary { lhs, op, rhs } => (*lhs, *op, *rhs),
        _ => return,
    };
    let Some(new_op) = table(op) else { return };
    if suppressed(info, ast, lhs, op, rhs) {
        return;
    }

    set_binary_op(ast, id, new_op);

    tester.test(ast);

    set_binary_op(ast, id, op);
}

fn assign_swap(op: AssignOp) -> Option<AssignOp> {
    Some(match op {
        AssignOp::AddAssign => AssignOp::SubAssign,
        AssignOp::SubAssign => AssignOp::AddAssign,
        AssignOp::MulAssign => AssignOp::QuoAssign,
        AssignOp::QuoAssign => AssignOp::MulAssign,
        AssignOp::RemAssign => AssignOp::MulAssign,
        AssignOp::AndAssign => AssignOp::OrAssign,
        AssignOp::OrAssign => AssignOp::AndAssign,
        AssignOp::XorAssign => AssignOp::AndAssign,
        AssignOp::ShlAssign => AssignOp::ShrAssign,
        AssignOp::ShrAssign => AssignOp::ShlAssign,
        _ => return None,
    })
}

/// The mathop table applied to compound assignments.
pub(crate) fn math_assign(info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    let (op, rhs) = match ast.stmt(id) {
        Stmt::Assign { op, rhs, .. } => (*op, rhs.clone()),
        _ => return,
    };
    let Some(new_op) = assign_swap(op) else { return };
    if rhs.len() > 1 {
        // `f0, f1 += 1, 2` is not valid input anyway.
        return;
    }
    match op {
        AssignOp::AddAssign | AssignOp::SubAssign => {
            if is_zero(ast, rhs[0]) {
                return;
            }
        }
        AssignOp::MulAssign | AssignOp::QuoAssign => {
            if is_one(ast, rhs[0]) {
                return;
            }
        }
        _ => {}
    }

    set_assign_op(ast, id, new_op);

    tester.test(ast);

    set_assign_op(ast, id, op);
}

/// Rewrites numeric return literals (zero to one, anything else to zero)
/// and shadows returned identifiers of basic type with a `_ = x` no-op
/// assignment inserted before the return.
///
/// Not wired to a CLI short name; the catalogue exposes nine operators and
/// this one is still being evaluated for too-easy equivalents on named
/// results.
pub fn return_value(info: &ParseInfo, ast: &mut Ast, node: Node, tester: &mut dyn Tester) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    let Some(list) = stmt_list(ast, id) else {
        return;
    };
    for (i, &sid) in list.iter().enumerate() {
        let results = match ast.stmt(sid) {
            Stmt::Return { results } => results.clone(),
            _ => continue,
        };
        for &res in &results {
            enum ResultKind {
                NumericLit(String),
                BasicIdent(String),
                Other,
            }
            let kind = match ast.expr(res) {
                Expr::Lit {
                    kind: LitKind::Int | LitKind::Float,
                    text,
                } => ResultKind::NumericLit(text.clone()),
                Expr::Ident(name) => {
                    let basic = info
                        .types
                        .get(res)
                        .and_then(|f| f.typ.basic())
                        .is_some();
                    if basic {
                        ResultKind::BasicIdent(name.clone())
                    } else {
                        ResultKind::Other
                    }
                }
                _ => ResultKind::Other,
            };
            match kind {
                ResultKind::NumericLit(old) => {
                    let repl = if is_zero(ast, res) { "1" } else { "0" };
                    set_lit_text(ast, res, repl.to_string());

                    tester.test(ast);

                    set_lit_text(ast, res, old);
                }
                ResultKind::BasicIdent(name) => {
                    let mark = ast.mark();
                    let pos = ast.stmt_pos(sid);
                    let blank = ast.alloc_expr(Expr::Ident("_".into()), pos);
                    let value = ast.alloc_expr(Expr::Ident(name), pos);
                    let unused = ast.alloc_stmt(
                        Stmt::Assign {
                            lhs: vec![blank],
                            op: AssignOp::Assign,
                            rhs: vec![value],
                        },
                        pos,
                    );
                    let mut mutation = list.clone();
                    mutation.insert(i, unused);
                    set_stmt_list(ast, id, mutation);

                    tester.test(ast);

                    set_stmt_list(ast, id, list.clone());
                    ast.truncate(mark);
                }
                ResultKind::Other => {}
            }
        }
    }
}

fn comparison_inverse(op: BinOp) -> BinOp {
    match op {
        BinOp::Eql => BinOp::Neq,
        BinOp::Neq => BinOp::Eql,
        BinOp::Lss => BinOp::Geq,
        BinOp::Geq => BinOp::Lss,
        BinOp::Leq => BinOp::Gtr,
        BinOp::Gtr => BinOp::Leq,
        op => op,
    }
}

/// Rewrites float comparisons to their De Morgan double negation
/// (`a < b` to `!(a >= b)`), which differs exactly when NaN is involved.
/// Carrier positions: assignment right-hand sides found in blocks, case
/// guards, if conditions, and sent channel values.
pub(crate) fn float_comparison_inverter(
    info: &ParseInfo,
    ast: &mut Ast,
    node: Node,
    tester: &mut dyn Tester,
) {
    if !covered(info, ast, node) {
        return;
    }
    let Node::Stmt(id) = node else { return };
    match ast.stmt(id) {
        Stmt::Block { list } => {
            let list = list.clone();
            for sid in list {
                let rhs = match ast.stmt(sid) {
                    Stmt::Assign { rhs, .. } => rhs.clone(),
                    _ => continue,
                };
                for r in rhs {
                    if !is_bool(info, r) {
                        continue;
                    }
                    invert_comparisons(info, ast, r, tester);
                }
            }
        }
        Stmt::Case { guards, .. } => {
            let guards = guards.clone();
            for g in guards {
                if !is_bool(info, g) {
                    continue;
                }
                invert_comparisons(info, ast, g, tester);
            }
        }
        Stmt::If { cond, .. } => {
            // If conditions are boolean by construction; no type gate.
            let cond = *cond;
            invert_comparisons(info, ast, cond, tester);
        }
        Stmt::Send { value, .. } => {
            let value = *value;
            if is_bool(info, value) {
                invert_comparisons(info, ast, value, tester);
            }
        }
        _ => {}
    }
}

/// Descends through parens, `!`, and the operands of `&&`/`||`; at each
/// comparison whose operands share one floating type, replaces the
/// subexpression in place with `!(lhs op' rhs)`, tests, and restores.
fn invert_comparisons(info: &ParseInfo, ast: &mut Ast, id: ExprId, tester: &mut dyn Tester) {
    enum Shape {
        Logical(ExprId, ExprId),
        Comparison(ExprId, BinOp, ExprId),
        Descend(ExprId),
        Leaf,
    }
    let shape = match ast.expr(id) {
        Expr::Binary { lhs, op, rhs } => match op {
            BinOp::LAnd | BinOp::LOr => Shape::Logical(*lhs, *rhs),
            op if op.is_comparison() => Shape::Comparison(*lhs, *op, *rhs),
            _ => Shape::Leaf,
        },
        Expr::Unary {
            op: UnaryOp::Not,
            operand,
        } => Shape::Descend(*operand),
        Expr::Paren { inner } => Shape::Descend(*inner),
        _ => Shape::Leaf,
    };
    match shape {
        Shape::Logical(lhs, rhs) => {
            invert_comparisons(info, ast, lhs, tester);
            invert_comparisons(info, ast, rhs, tester);
        }
        Shape::Descend(inner) => invert_comparisons(info, ast, inner, tester),
        Shape::Comparison(lhs, op, rhs) => {
            let lhs_kind = info.types.get(lhs).and_then(|f| f.typ.basic());
            let Some(lk) = lhs_kind else { return };
            if !lk.is_float() {
                return;
            }
            let rhs_kind = info.types.get(rhs).and_then(|f| f.typ.basic());
            if rhs_kind != Some(lk) {
                return;
            }

            let mark = ast.mark();
            let pos = ast.expr_pos(id);
            let inverted = ast.alloc_expr(
                Expr::Binary {
                    lhs,
                    op: comparison_inverse(op),
                    rhs,
                },
                pos,
            );
            let original = std::mem::replace(
                ast.expr_mut(id),
                Expr::Unary {
                    op: UnaryOp::Not,
                    operand: inverted,
                },
            );

            tester.test(ast);

            *ast.expr_mut(id) = original;
            ast.truncate(mark);
        }
        Shape::Leaf => {}
    }
}

// ----- slot accessors -----
//
// These panic on a shape mismatch: callers only reach them after matching
// the node, so a mismatch means an operator corrupted the tree.

fn set_block_list(ast: &mut Ast, id: StmtId, new: Vec<StmtId>) {
    match ast.stmt_mut(id) {
        Stmt::Block { list } => *list = new,
        other => unreachable!("expected block statement, found {other:?}"),
    }
}

fn stmt_list(ast: &Ast, id: StmtId) -> Option<Vec<StmtId>> {
    match ast.stmt(id) {
        Stmt::Block { list } => Some(list.clone()),
        Stmt::Case { body, .. } => Some(body.clone()),
        _ => None,
    }
}

fn set_stmt_list(ast: &mut Ast, id: StmtId, new: Vec<StmtId>) {
    match ast.stmt_mut(id) {
        Stmt::Block { list } => *list = new,
        Stmt::Case { body, .. } => *body = new,
        other => unreachable!("expected block or case, found {other:?}"),
    }
}

fn set_if_branches(ast: &mut Ast, id: StmtId, body: StmtId, els: StmtId) {
    match ast.stmt_mut(id) {
        Stmt::If {
            body: b, els: e, ..
        } => {
            *b = body;
            *e = Some(els);
        }
        other => unreachable!("expected if statement, found {other:?}"),
    }
}

fn swap_case_bodies(ast: &mut Ast, a: StmtId, b: StmtId) {
    let first = match ast.stmt_mut(a) {
        Stmt::Case { body, .. } => std::mem::take(body),
        other => unreachable!("expected case clause, found {other:?}"),
    };
    let second = match ast.stmt_mut(b) {
        Stmt::Case { body, .. } => std::mem::replace(body, first),
        other => unreachable!("expected case clause, found {other:?}"),
    };
    set_stmt_list(ast, a, second);
}

fn set_binary_op(ast: &mut Ast, id: ExprId, new: BinOp) {
    match ast.expr_mut(id) {
        Expr::Binary { op, .. } => *op = new,
        other => unreachable!("expected binary expression, found {other:?}"),
    }
}

fn set_assign_op(ast: &mut Ast, id: StmtId, new: AssignOp) {
    match ast.stmt_mut(id) {
        Stmt::Assign { op, .. } => *op = new,
        other => unreachable!("expected assignment, found {other:?}"),
    }
}

fn set_lit_text(ast: &mut Ast, id: ExprId, new: String) {
    match ast.expr_mut(id) {
        Expr::Lit { text, .. } => *text = new,
        other => unreachable!("expected literal, found {other:?}"),
    }
}
