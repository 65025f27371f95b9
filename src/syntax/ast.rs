//! Arena-allocated syntax tree.
//!
//! Expressions and statements live in per-file arenas addressed by typed
//! ids; node start positions sit in parallel side tables. Mutation operators
//! rewrite arena slots (or id lists held by parent nodes) in place and put
//! the original values back before returning, so a parent never needs a
//! pointer to its children beyond the ids it already holds. Nodes allocated
//! while a mutation is live are discarded by truncating the arenas back to a
//! recorded mark.

use super::pos::Pos;
use super::token::{AssignOp, BinOp, LitKind, UnaryOp};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl StmtId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Transient sentinel used while a range header is folded out of the
    /// simple-statement parse; never stored in a finished tree.
    pub(crate) const PLACEHOLDER: StmtId = StmtId(u32::MAX);
}

/// A handle to any tree node the walker can hand to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Expr(ExprId),
    Stmt(StmtId),
}

/// Channel direction for channel type expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A parameter group or struct field: `a, b int` or an embedded type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<String>,
    pub typ: ExprId,
    pub tag: Option<String>,
}

/// One element of an interface type: a method signature or an embedded
/// interface name.
#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method {
        name: String,
        params: Vec<Field>,
        results: Vec<Field>,
    },
    Embedded(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Lit {
        kind: LitKind,
        text: String,
    },
    Paren {
        inner: ExprId,
    },
    Selector {
        base: ExprId,
        name: String,
    },
    Index {
        base: ExprId,
        index: ExprId,
    },
    Slice {
        base: ExprId,
        low: Option<ExprId>,
        high: Option<ExprId>,
        max: Option<ExprId>,
    },
    Call {
        fun: ExprId,
        args: Vec<ExprId>,
        ellipsis: bool,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// `*T` / `*p`: pointer type or dereference, disambiguated by context.
    Star {
        operand: ExprId,
    },
    Binary {
        lhs: ExprId,
        op: BinOp,
        rhs: ExprId,
    },
    KeyValue {
        key: ExprId,
        value: ExprId,
    },
    TypeAssert {
        base: ExprId,
        typ: ExprId,
    },
    Composite {
        typ: Option<ExprId>,
        elems: Vec<ExprId>,
    },
    FuncLit {
        params: Vec<Field>,
        results: Vec<Field>,
        body: StmtId,
    },
    Ellipsis {
        elem: Option<ExprId>,
    },

    // Type expressions.
    ArrayType {
        len: Option<ExprId>,
        elem: ExprId,
    },
    MapType {
        key: ExprId,
        value: ExprId,
    },
    ChanType {
        dir: ChanDir,
        elem: ExprId,
    },
    StructType {
        fields: Vec<Field>,
    },
    InterfaceType {
        elems: Vec<InterfaceElem>,
    },
    FuncType {
        params: Vec<Field>,
        results: Vec<Field>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Fallthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Const,
    Type,
}

/// One name-binding inside a `var`/`const`/`type` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Spec {
    pub names: Vec<String>,
    pub typ: Option<ExprId>,
    pub values: Vec<ExprId>,
}

/// A grouped or single `var`/`const`/`type` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
    pub kind: DeclKind,
    pub specs: Vec<Spec>,
    pub grouped: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Empty,
    Expr {
        expr: ExprId,
    },
    Send {
        chan: ExprId,
        value: ExprId,
    },
    IncDec {
        expr: ExprId,
        inc: bool,
    },
    Assign {
        lhs: Vec<ExprId>,
        op: AssignOp,
        rhs: Vec<ExprId>,
    },
    Decl(GenDecl),
    Return {
        results: Vec<ExprId>,
    },
    Branch {
        kind: BranchKind,
    },
    Block {
        list: Vec<StmtId>,
    },
    If {
        init: Option<StmtId>,
        cond: ExprId,
        body: StmtId,
        els: Option<StmtId>,
    },
    Switch {
        init: Option<StmtId>,
        tag: Option<ExprId>,
        cases: Vec<StmtId>,
    },
    Case {
        guards: Vec<ExprId>,
        body: Vec<StmtId>,
    },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        post: Option<StmtId>,
        body: StmtId,
    },
    Range {
        key: Option<ExprId>,
        value: Option<ExprId>,
        define: bool,
        expr: ExprId,
        body: StmtId,
    },
    Go {
        call: ExprId,
    },
    Defer {
        call: ExprId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Field>,
    pub name: String,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub body: Option<StmtId>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub alias: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    Gen(GenDecl),
}

/// Restore point for arena allocations made during a live mutation.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    exprs: usize,
    stmts: usize,
}

/// The arena holding one file's tree.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Ast {
    exprs: Vec<Expr>,
    expr_pos: Vec<Pos>,
    stmts: Vec<Stmt>,
    stmt_pos: Vec<Pos>,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr, pos: Pos) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        self.expr_pos.push(pos);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt, pos: Pos) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        self.stmt_pos.push(pos);
        id
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    pub fn expr_pos(&self, id: ExprId) -> Pos {
        self.expr_pos[id.index()]
    }

    pub fn stmt_pos(&self, id: StmtId) -> Pos {
        self.stmt_pos[id.index()]
    }

    pub fn node_pos(&self, node: Node) -> Pos {
        match node {
            Node::Expr(id) => self.expr_pos(id),
            Node::Stmt(id) => self.stmt_pos(id),
        }
    }

    /// Records the current allocation high-water mark.
    pub fn mark(&self) -> Mark {
        Mark {
            exprs: self.exprs.len(),
            stmts: self.stmts.len(),
        }
    }

    /// Discards every node allocated after `mark`. Callers must have
    /// unlinked those nodes from the tree first.
    pub fn truncate(&mut self, mark: Mark) {
        self.exprs.truncate(mark.exprs);
        self.expr_pos.truncate(mark.exprs);
        self.stmts.truncate(mark.stmts);
        self.stmt_pos.truncate(mark.stmts);
    }

    fn field_children(fields: &[Field], out: &mut Vec<Node>) {
        for f in fields {
            out.push(Node::Expr(f.typ));
        }
    }

    /// Direct children of an expression, in source order.
    pub fn expr_children(&self, id: ExprId, out: &mut Vec<Node>) {
        match self.expr(id) {
            Expr::Ident(_) | Expr::Lit { .. } => {}
            Expr::Paren { inner } => out.push(Node::Expr(*inner)),
            Expr::Selector { base, .. } => out.push(Node::Expr(*base)),
            Expr::Index { base, index } => {
                out.push(Node::Expr(*base));
                out.push(Node::Expr(*index));
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
            } => {
                out.push(Node::Expr(*base));
                out.extend(low.iter().map(|&e| Node::Expr(e)));
                out.extend(high.iter().map(|&e| Node::Expr(e)));
                out.extend(max.iter().map(|&e| Node::Expr(e)));
            }
            Expr::Call { fun, args, .. } => {
                out.push(Node::Expr(*fun));
                out.extend(args.iter().map(|&e| Node::Expr(e)));
            }
            Expr::Unary { operand, .. } | Expr::Star { operand } => {
                out.push(Node::Expr(*operand))
            }
            Expr::Binary { lhs, rhs, .. } => {
                out.push(Node::Expr(*lhs));
                out.push(Node::Expr(*rhs));
            }
            Expr::KeyValue { key, value } => {
                out.push(Node::Expr(*key));
                out.push(Node::Expr(*value));
            }
            Expr::TypeAssert { base, typ } => {
                out.push(Node::Expr(*base));
                out.push(Node::Expr(*typ));
            }
            Expr::Composite { typ, elems } => {
                out.extend(typ.iter().map(|&e| Node::Expr(e)));
                out.extend(elems.iter().map(|&e| Node::Expr(e)));
            }
            Expr::FuncLit {
                params,
                results,
                body,
            } => {
                Self::field_children(params, out);
                Self::field_children(results, out);
                out.push(Node::Stmt(*body));
            }
            Expr::Ellipsis { elem } => out.extend(elem.iter().map(|&e| Node::Expr(e))),
            Expr::ArrayType { len, elem } => {
                out.extend(len.iter().map(|&e| Node::Expr(e)));
                out.push(Node::Expr(*elem));
            }
            Expr::MapType { key, value } => {
                out.push(Node::Expr(*key));
                out.push(Node::Expr(*value));
            }
            Expr::ChanType { elem, .. } => out.push(Node::Expr(*elem)),
            Expr::StructType { fields } => Self::field_children(fields, out),
            Expr::InterfaceType { elems } => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method {
                            params, results, ..
                        } => {
                            Self::field_children(params, out);
                            Self::field_children(results, out);
                        }
                        InterfaceElem::Embedded(e) => out.push(Node::Expr(*e)),
                    }
                }
            }
            Expr::FuncType { params, results } => {
                Self::field_children(params, out);
                Self::field_children(results, out);
            }
        }
    }

    /// Direct children of a statement, in source order.
    pub fn stmt_children(&self, id: StmtId, out: &mut Vec<Node>) {
        match self.stmt(id) {
            Stmt::Empty | Stmt::Branch { .. } => {}
            Stmt::Expr { expr } => out.push(Node::Expr(*expr)),
            Stmt::Send { chan, value } => {
                out.push(Node::Expr(*chan));
                out.push(Node::Expr(*value));
            }
            Stmt::IncDec { expr, .. } => out.push(Node::Expr(*expr)),
            Stmt::Assign { lhs, rhs, .. } => {
                out.extend(lhs.iter().map(|&e| Node::Expr(e)));
                out.extend(rhs.iter().map(|&e| Node::Expr(e)));
            }
            Stmt::Decl(decl) => {
                for spec in &decl.specs {
                    out.extend(spec.typ.iter().map(|&e| Node::Expr(e)));
                    out.extend(spec.values.iter().map(|&e| Node::Expr(e)));
                }
            }
            Stmt::Return { results } => {
                out.extend(results.iter().map(|&e| Node::Expr(e)))
            }
            Stmt::Block { list } => out.extend(list.iter().map(|&s| Node::Stmt(s))),
            Stmt::If {
                init,
                cond,
                body,
                els,
            } => {
                out.extend(init.iter().map(|&s| Node::Stmt(s)));
                out.push(Node::Expr(*cond));
                out.push(Node::Stmt(*body));
                out.extend(els.iter().map(|&s| Node::Stmt(s)));
            }
            Stmt::Switch { init, tag, cases } => {
                out.extend(init.iter().map(|&s| Node::Stmt(s)));
                out.extend(tag.iter().map(|&e| Node::Expr(e)));
                out.extend(cases.iter().map(|&s| Node::Stmt(s)));
            }
            Stmt::Case { guards, body } => {
                out.extend(guards.iter().map(|&e| Node::Expr(e)));
                out.extend(body.iter().map(|&s| Node::Stmt(s)));
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                out.extend(init.iter().map(|&s| Node::Stmt(s)));
                out.extend(cond.iter().map(|&e| Node::Expr(e)));
                out.extend(post.iter().map(|&s| Node::Stmt(s)));
                out.push(Node::Stmt(*body));
            }
            Stmt::Range {
                key,
                value,
                expr,
                body,
                ..
            } => {
                out.extend(key.iter().map(|&e| Node::Expr(e)));
                out.extend(value.iter().map(|&e| Node::Expr(e)));
                out.push(Node::Expr(*expr));
                out.push(Node::Stmt(*body));
            }
            Stmt::Go { call } | Stmt::Defer { call } => out.push(Node::Expr(*call)),
        }
    }

    /// Top-level nodes of every declaration, in source order.
    pub fn decl_children(&self, out: &mut Vec<Node>) {
        for decl in &self.decls {
            match decl {
                Decl::Func(f) => {
                    if let Some(recv) = &f.recv {
                        out.push(Node::Expr(recv.typ));
                    }
                    Self::field_children(&f.params, out);
                    Self::field_children(&f.results, out);
                    out.extend(f.body.iter().map(|&s| Node::Stmt(s)));
                }
                Decl::Gen(g) => {
                    for spec in &g.specs {
                        out.extend(spec.typ.iter().map(|&e| Node::Expr(e)));
                        out.extend(spec.values.iter().map(|&e| Node::Expr(e)));
                    }
                }
            }
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub pkg_name: String,
    pub ast: Ast,
}

impl SourceFile {
    /// Base file name, e.g. `a.go`.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// True for `*_test.go` files, which are never mutated.
    pub fn is_test_file(&self) -> bool {
        self.base_name().ends_with("_test.go")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_alloc_and_truncate() {
        let mut ast = Ast::new();
        let a = ast.alloc_expr(Expr::Ident("a".into()), 1);
        let mark = ast.mark();
        let b = ast.alloc_expr(Expr::Ident("b".into()), 2);
        let s = ast.alloc_stmt(Stmt::Expr { expr: b }, 2);
        assert_eq!(ast.expr(b), &Expr::Ident("b".into()));
        assert_eq!(ast.stmt(s), &Stmt::Expr { expr: b });
        ast.truncate(mark);
        assert_eq!(ast.expr(a), &Expr::Ident("a".into()));
        assert_eq!(ast.mark().exprs, 1);
        assert_eq!(ast.mark().stmts, 0);
    }

    #[test]
    fn test_stmt_children_order() {
        let mut ast = Ast::new();
        let cond = ast.alloc_expr(Expr::Ident("c".into()), 1);
        let body = ast.alloc_stmt(Stmt::Block { list: vec![] }, 2);
        let els = ast.alloc_stmt(Stmt::Block { list: vec![] }, 3);
        let ifs = ast.alloc_stmt(
            Stmt::If {
                init: None,
                cond,
                body,
                els: Some(els),
            },
            1,
        );
        let mut out = Vec::new();
        ast.stmt_children(ifs, &mut out);
        assert_eq!(
            out,
            vec![Node::Expr(cond), Node::Stmt(body), Node::Stmt(els)]
        );
    }

    #[test]
    fn test_is_test_file() {
        let file = SourceFile {
            path: PathBuf::from("/tmp/pkg/a_test.go"),
            pkg_name: "pkg".into(),
            ast: Ast::new(),
        };
        assert!(file.is_test_file());
        let file = SourceFile {
            path: PathBuf::from("/tmp/pkg/a.go"),
            pkg_name: "pkg".into(),
            ast: Ast::new(),
        };
        assert!(!file.is_test_file());
    }
}
