//! Package-local type facts.
//!
//! The mutation operators consume a small set of type questions: is this
//! expression a string, a bool, a float of a given width, and does this call
//! produce no value. Answering them does not need a full type checker; it
//! needs the package's own declarations and Go's literal/conversion rules.
//!
//! Two passes. The first collects package-level signatures, variables,
//! constants and named types across every production file. The second walks
//! each file's bodies with lexical scopes and records a [`TypeFact`] for
//! every expression it can deduce. An expression with no recorded fact is
//! simply unknown, and every consumer treats unknown as "do not mutate" —
//! cross-package calls are therefore never considered void, and imported
//! types never read as string, bool, or float.

use crate::syntax::ast::{
    Ast, Decl, DeclKind, Expr, ExprId, Field, GenDecl, SourceFile, Stmt, StmtId,
};
use crate::syntax::token::{AssignOp, BinOp, LitKind, UnaryOp};
use std::collections::{HashMap, HashSet};

/// Basic (predeclared) type kinds, untyped constant kinds included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Str,
    UntypedBool,
    UntypedInt,
    UntypedFloat,
    UntypedRune,
    UntypedString,
}

impl BasicKind {
    pub fn from_name(name: &str) -> Option<BasicKind> {
        use BasicKind::*;
        Some(match name {
            "bool" => Bool,
            "int" => Int,
            "int8" => Int8,
            "int16" => Int16,
            "int32" => Int32,
            "int64" => Int64,
            "uint" => Uint,
            "uint8" => Uint8,
            "uint16" => Uint16,
            "uint32" => Uint32,
            "uint64" => Uint64,
            "uintptr" => Uintptr,
            "float32" => Float32,
            "float64" => Float64,
            "complex64" => Complex64,
            "complex128" => Complex128,
            "string" => Str,
            "byte" => Uint8,
            "rune" => Int32,
            _ => return None,
        })
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::Str | BasicKind::UntypedString)
    }

    pub fn is_bool(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn is_untyped(self) -> bool {
        use BasicKind::*;
        matches!(
            self,
            UntypedBool | UntypedInt | UntypedFloat | UntypedRune | UntypedString
        )
    }

    fn is_untyped_numeric(self) -> bool {
        use BasicKind::*;
        matches!(self, UntypedInt | UntypedFloat | UntypedRune)
    }

    /// The type an untyped constant assumes when bound without annotation.
    pub fn default_type(self) -> BasicKind {
        use BasicKind::*;
        match self {
            UntypedBool => Bool,
            UntypedInt => Int,
            UntypedFloat => Float64,
            UntypedRune => Int32,
            UntypedString => Str,
            k => k,
        }
    }
}

/// The shape of a deduced type, trimmed to what the operators ask about.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Pointer,
    Named(String),
    Other,
}

impl Type {
    pub fn basic(&self) -> Option<BasicKind> {
        match self {
            Type::Basic(k) => Some(*k),
            _ => None,
        }
    }
}

/// Per-expression deduction: the type, and whether the expression is a call
/// producing no value.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFact {
    pub typ: Type,
    pub is_void: bool,
}

impl TypeFact {
    fn of(typ: Type) -> Self {
        Self {
            typ,
            is_void: false,
        }
    }
}

/// The fact table for one file.
#[derive(Debug, Default)]
pub struct TypeInfo {
    facts: HashMap<ExprId, TypeFact>,
}

impl TypeInfo {
    pub fn get(&self, id: ExprId) -> Option<&TypeFact> {
        self.facts.get(&id)
    }

    fn set(&mut self, id: ExprId, fact: TypeFact) {
        self.facts.insert(id, fact);
    }
}

/// Package-level declarations gathered from every production file.
#[derive(Debug, Default)]
struct PackageScope {
    /// Function name to result types.
    funcs: HashMap<String, Vec<Type>>,
    /// Method name to result types. Receiver types are not tracked; a
    /// package rarely reuses one method name with different result shapes,
    /// and a wrong guess only costs a skipped or extra type fact.
    methods: HashMap<String, Vec<Type>>,
    /// Package vars and consts.
    globals: HashMap<String, Type>,
    /// Named types declared in the package.
    types: HashSet<String>,
}

/// Type-checks the production files of one package. Returns one fact table
/// per input file, in order.
pub fn check_package(files: &[&SourceFile]) -> Vec<TypeInfo> {
    let mut scope = PackageScope::default();
    for file in files {
        collect_package_scope(&file.ast, &mut scope);
    }
    files
        .iter()
        .map(|file| {
            let mut checker = Checker {
                ast: &file.ast,
                scope: &scope,
                locals: Vec::new(),
                info: TypeInfo::default(),
            };
            checker.check_file();
            checker.info
        })
        .collect()
}

fn collect_package_scope(ast: &Ast, scope: &mut PackageScope) {
    for decl in &ast.decls {
        match decl {
            Decl::Func(f) => {
                let mut results = Vec::new();
                for field in &f.results {
                    let t = eval_type(ast, field.typ);
                    let n = field.names.len().max(1);
                    for _ in 0..n {
                        results.push(t.clone());
                    }
                }
                if f.recv.is_some() {
                    scope.methods.insert(f.name.clone(), results);
                } else {
                    scope.funcs.insert(f.name.clone(), results);
                }
            }
            Decl::Gen(g) => match g.kind {
                DeclKind::Type => {
                    for spec in &g.specs {
                        for name in &spec.names {
                            scope.types.insert(name.clone());
                        }
                    }
                }
                DeclKind::Var | DeclKind::Const => {
                    for spec in &g.specs {
                        let typ = spec.typ.map(|t| eval_type(ast, t));
                        for (i, name) in spec.names.iter().enumerate() {
                            let t = typ.clone().unwrap_or_else(|| {
                                spec.values
                                    .get(i)
                                    .map(|&v| literal_default(ast, v))
                                    .unwrap_or(Type::Other)
                            });
                            scope.globals.insert(name.clone(), t);
                        }
                    }
                }
            },
        }
    }
}

/// Shallow type of a package-level initializer, used before bodies are
/// walked (only literals and named references matter at this point).
fn literal_default(ast: &Ast, id: ExprId) -> Type {
    match ast.expr(id) {
        Expr::Lit { kind, .. } => match kind {
            LitKind::Int => Type::Basic(BasicKind::Int),
            LitKind::Float => Type::Basic(BasicKind::Float64),
            LitKind::Char => Type::Basic(BasicKind::Int32),
            LitKind::String => Type::Basic(BasicKind::Str),
            LitKind::Imag => Type::Basic(BasicKind::Complex128),
        },
        Expr::Composite { typ: Some(t), .. } => literal_default(ast, *t),
        Expr::Ident(name) => match BasicKind::from_name(name) {
            Some(k) => Type::Basic(k),
            None => Type::Named(name.clone()),
        },
        Expr::Unary { operand, .. } | Expr::Paren { inner: operand } => {
            literal_default(ast, *operand)
        }
        _ => Type::Other,
    }
}

/// Evaluates a type expression to a [`Type`].
fn eval_type(ast: &Ast, id: ExprId) -> Type {
    match ast.expr(id) {
        Expr::Ident(name) => match BasicKind::from_name(name) {
            Some(k) => Type::Basic(k),
            None => Type::Named(name.clone()),
        },
        Expr::Star { .. } => Type::Pointer,
        Expr::Paren { inner } => eval_type(ast, *inner),
        Expr::Selector { base, name } => {
            if let Expr::Ident(pkg) = ast.expr(*base) {
                Type::Named(format!("{pkg}.{name}"))
            } else {
                Type::Other
            }
        }
        _ => Type::Other,
    }
}

struct Checker<'a> {
    ast: &'a Ast,
    scope: &'a PackageScope,
    locals: Vec<HashMap<String, Type>>,
    info: TypeInfo,
}

impl<'a> Checker<'a> {
    fn check_file(&mut self) {
        for decl in &self.ast.decls {
            match decl {
                Decl::Func(f) => {
                    self.locals.push(HashMap::new());
                    if let Some(recv) = &f.recv {
                        self.bind_fields(std::slice::from_ref(recv));
                    }
                    self.bind_fields(&f.params);
                    self.bind_fields(&f.results);
                    if let Some(body) = f.body {
                        self.check_stmt(body);
                    }
                    self.locals.pop();
                }
                Decl::Gen(g) => {
                    for spec in &g.specs {
                        for &value in &spec.values {
                            self.check_expr(value);
                        }
                    }
                }
            }
        }
    }

    fn bind_fields(&mut self, fields: &[Field]) {
        for field in fields {
            let t = eval_type(self.ast, field.typ);
            for name in &field.names {
                self.bind(name, t.clone());
            }
        }
    }

    fn bind(&mut self, name: &str, typ: Type) {
        if name == "_" {
            return;
        }
        if let Some(top) = self.locals.last_mut() {
            top.insert(name.to_string(), typ);
        }
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        for scope in self.locals.iter().rev() {
            if let Some(t) = scope.get(name) {
                return Some(t.clone());
            }
        }
        self.scope.globals.get(name).cloned()
    }

    fn check_stmt(&mut self, id: StmtId) {
        match self.ast.stmt(id) {
            Stmt::Empty | Stmt::Branch { .. } => {}
            Stmt::Expr { expr } => {
                self.check_expr(*expr);
            }
            Stmt::Send { chan, value } => {
                let (chan, value) = (*chan, *value);
                self.check_expr(chan);
                self.check_expr(value);
            }
            Stmt::IncDec { expr, .. } => {
                self.check_expr(*expr);
            }
            Stmt::Assign { lhs, op, rhs } => {
                let (lhs, op, rhs) = (lhs.clone(), *op, rhs.clone());
                self.check_assign(&lhs, op, &rhs);
            }
            Stmt::Decl(g) => {
                let g = g.clone();
                self.check_local_decl(&g);
            }
            Stmt::Return { results } => {
                for &e in &results.clone() {
                    self.check_expr(e);
                }
            }
            Stmt::Block { list } => {
                let list = list.clone();
                self.locals.push(HashMap::new());
                for s in list {
                    self.check_stmt(s);
                }
                self.locals.pop();
            }
            Stmt::If {
                init,
                cond,
                body,
                els,
            } => {
                let (init, cond, body, els) = (*init, *cond, *body, *els);
                self.locals.push(HashMap::new());
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                self.check_expr(cond);
                self.check_stmt(body);
                if let Some(els) = els {
                    self.check_stmt(els);
                }
                self.locals.pop();
            }
            Stmt::Switch { init, tag, cases } => {
                let (init, tag, cases) = (*init, *tag, cases.clone());
                self.locals.push(HashMap::new());
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(tag) = tag {
                    self.check_expr(tag);
                }
                for case in cases {
                    self.check_stmt(case);
                }
                self.locals.pop();
            }
            Stmt::Case { guards, body } => {
                let (guards, body) = (guards.clone(), body.clone());
                self.locals.push(HashMap::new());
                for g in guards {
                    self.check_expr(g);
                }
                for s in body {
                    self.check_stmt(s);
                }
                self.locals.pop();
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
            } => {
                let (init, cond, post, body) = (*init, *cond, *post, *body);
                self.locals.push(HashMap::new());
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_expr(cond);
                }
                if let Some(post) = post {
                    self.check_stmt(post);
                }
                self.check_stmt(body);
                self.locals.pop();
            }
            Stmt::Range {
                key,
                value,
                define,
                expr,
                body,
            } => {
                let (key, value, define, expr, body) = (*key, *value, *define, *expr, *body);
                self.locals.push(HashMap::new());
                self.check_expr(expr);
                if define {
                    // Element types of the ranged container are not tracked.
                    for id in [key, value].into_iter().flatten() {
                        self.define_ident(id, Type::Other);
                    }
                } else {
                    for id in [key, value].into_iter().flatten() {
                        self.check_expr(id);
                    }
                }
                self.check_stmt(body);
                self.locals.pop();
            }
            Stmt::Go { call } | Stmt::Defer { call } => {
                self.check_expr(*call);
            }
        }
    }

    fn check_local_decl(&mut self, g: &GenDecl) {
        if g.kind == DeclKind::Type {
            return;
        }
        for spec in &g.specs {
            for &value in &spec.values {
                self.check_expr(value);
            }
            let typ = spec.typ.map(|t| eval_type(self.ast, t));
            for (i, name) in spec.names.iter().enumerate() {
                let t = typ.clone().unwrap_or_else(|| {
                    spec.values
                        .get(i)
                        .and_then(|&v| self.info.get(v))
                        .map(|f| defaulted(&f.typ))
                        .unwrap_or(Type::Other)
                });
                self.bind(name, t);
            }
        }
    }

    fn check_assign(&mut self, lhs: &[ExprId], op: AssignOp, rhs: &[ExprId]) {
        for &e in rhs {
            self.check_expr(e);
        }
        if op != AssignOp::Define {
            for &e in lhs {
                self.check_expr(e);
            }
            return;
        }
        if lhs.len() > 1 && rhs.len() == 1 {
            // Multi-value call: distribute the callee's result types.
            let results = self.call_results(rhs[0]);
            for (i, &l) in lhs.iter().enumerate() {
                let t = results
                    .as_ref()
                    .and_then(|r| r.get(i).cloned())
                    .unwrap_or(Type::Other);
                self.define_ident(l, t);
            }
            return;
        }
        for (i, &l) in lhs.iter().enumerate() {
            let t = rhs
                .get(i)
                .and_then(|&r| self.info.get(r))
                .map(|f| defaulted(&f.typ))
                .unwrap_or(Type::Other);
            self.define_ident(l, t);
        }
    }

    fn call_results(&self, id: ExprId) -> Option<Vec<Type>> {
        let Expr::Call { fun, .. } = self.ast.expr(id) else {
            return None;
        };
        match self.ast.expr(*fun) {
            Expr::Ident(name) => self.scope.funcs.get(name).cloned(),
            Expr::Selector { name, .. } => self.scope.methods.get(name).cloned(),
            _ => None,
        }
    }

    fn define_ident(&mut self, id: ExprId, typ: Type) {
        if let Expr::Ident(name) = self.ast.expr(id) {
            let name = name.clone();
            self.bind(&name, typ.clone());
            self.info.set(id, TypeFact::of(typ));
        }
    }

    fn check_expr(&mut self, id: ExprId) -> Option<TypeFact> {
        let fact = match self.ast.expr(id) {
            Expr::Lit { kind, .. } => {
                let k = match kind {
                    LitKind::Int => BasicKind::UntypedInt,
                    LitKind::Float => BasicKind::UntypedFloat,
                    LitKind::Char => BasicKind::UntypedRune,
                    LitKind::String => BasicKind::UntypedString,
                    LitKind::Imag => return None,
                };
                Some(TypeFact::of(Type::Basic(k)))
            }
            Expr::Ident(name) => match name.as_str() {
                "true" | "false" => Some(TypeFact::of(Type::Basic(BasicKind::UntypedBool))),
                "iota" => Some(TypeFact::of(Type::Basic(BasicKind::UntypedInt))),
                "nil" | "_" => None,
                _ => self.lookup(name).map(TypeFact::of),
            },
            Expr::Paren { inner } => {
                let inner = *inner;
                self.check_expr(inner)
            }
            Expr::Unary { op, operand } => {
                let (op, operand) = (*op, *operand);
                let inner = self.check_expr(operand);
                match op {
                    UnaryOp::Not => {
                        // `!` only applies to booleans; propagate the
                        // operand's flavor of bool when known.
                        match inner {
                            Some(f) if f.typ.basic().is_some_and(BasicKind::is_bool) => Some(f),
                            _ => Some(TypeFact::of(Type::Basic(BasicKind::Bool))),
                        }
                    }
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => inner,
                    UnaryOp::Addr => Some(TypeFact::of(Type::Pointer)),
                    UnaryOp::Recv => None,
                }
            }
            Expr::Star { operand } => {
                let operand = *operand;
                self.check_expr(operand);
                None
            }
            Expr::Binary { lhs, op, rhs } => {
                let (lhs, op, rhs) = (*lhs, *op, *rhs);
                self.check_binary(lhs, op, rhs)
            }
            Expr::Call {
                fun,
                args,
                ellipsis: _,
            } => {
                let (fun, args) = (*fun, args.clone());
                self.check_expr(fun);
                for a in args {
                    self.check_expr(a);
                }
                self.check_call(fun)
            }
            Expr::Selector { base, .. } => {
                let base = *base;
                self.check_expr(base);
                None
            }
            Expr::Index { base, index } => {
                let (base, index) = (*base, *index);
                self.check_expr(base);
                self.check_expr(index);
                None
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
            } => {
                let ids: Vec<ExprId> = [Some(*base), *low, *high, *max]
                    .into_iter()
                    .flatten()
                    .collect();
                for e in ids {
                    self.check_expr(e);
                }
                None
            }
            Expr::KeyValue { key, value } => {
                let (key, value) = (*key, *value);
                self.check_expr(key);
                self.check_expr(value);
                None
            }
            Expr::TypeAssert { base, typ } => {
                let (base, typ) = (*base, *typ);
                self.check_expr(base);
                Some(TypeFact::of(eval_type(self.ast, typ)))
            }
            Expr::Composite { typ, elems } => {
                let (typ, elems) = (*typ, elems.clone());
                for e in elems {
                    self.check_expr(e);
                }
                typ.map(|t| TypeFact::of(eval_type(self.ast, t)))
            }
            Expr::FuncLit {
                params,
                results,
                body,
            } => {
                let (params, results, body) = (params.clone(), results.clone(), *body);
                self.locals.push(HashMap::new());
                self.bind_fields(&params);
                self.bind_fields(&results);
                self.check_stmt(body);
                self.locals.pop();
                Some(TypeFact::of(Type::Other))
            }
            Expr::Ellipsis { .. }
            | Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::ChanType { .. }
            | Expr::StructType { .. }
            | Expr::InterfaceType { .. }
            | Expr::FuncType { .. } => None,
        };
        if let Some(fact) = &fact {
            self.info.set(id, fact.clone());
        }
        fact
    }

    fn check_binary(&mut self, lhs: ExprId, op: BinOp, rhs: ExprId) -> Option<TypeFact> {
        let lf = self.check_expr(lhs);
        let rf = self.check_expr(rhs);
        let lb = lf.as_ref().and_then(|f| f.typ.basic());
        let rb = rf.as_ref().and_then(|f| f.typ.basic());

        // Untyped operands materialize as the typed side's type; the float
        // comparison rewrite depends on both sides carrying the same width.
        if let (Some(l), Some(r)) = (lb, rb) {
            if !l.is_untyped() && r.is_untyped_numeric() {
                self.info.set(rhs, TypeFact::of(Type::Basic(l)));
            } else if !r.is_untyped() && l.is_untyped_numeric() {
                self.info.set(lhs, TypeFact::of(Type::Basic(r)));
            }
        }

        if op.is_comparison() || matches!(op, BinOp::LAnd | BinOp::LOr) {
            return Some(TypeFact::of(Type::Basic(BasicKind::Bool)));
        }
        if matches!(op, BinOp::Shl | BinOp::Shr) {
            return lf;
        }
        // Arithmetic and bitwise: a typed side wins, untyped sides unify.
        match (lb, rb) {
            (Some(l), _) if !l.is_untyped() => lf,
            (_, Some(r)) if !r.is_untyped() => rf,
            (Some(l), Some(r)) => {
                let k = if l == BasicKind::UntypedFloat || r == BasicKind::UntypedFloat {
                    BasicKind::UntypedFloat
                } else if l == BasicKind::UntypedString || r == BasicKind::UntypedString {
                    BasicKind::UntypedString
                } else {
                    l
                };
                Some(TypeFact::of(Type::Basic(k)))
            }
            _ => match (&lf, &rf) {
                (Some(f), _) | (_, Some(f)) if f.typ != Type::Other => Some(f.clone()),
                _ => None,
            },
        }
    }

    fn check_call(&mut self, fun: ExprId) -> Option<TypeFact> {
        match self.ast.expr(fun) {
            Expr::Ident(name) => {
                // Conversions to basic or package-local named types.
                if let Some(k) = BasicKind::from_name(name) {
                    return Some(TypeFact::of(Type::Basic(k)));
                }
                if self.scope.types.contains(name) {
                    return Some(TypeFact::of(Type::Named(name.clone())));
                }
                match name.as_str() {
                    "len" | "cap" => return Some(TypeFact::of(Type::Basic(BasicKind::Int))),
                    "panic" | "print" | "println" | "delete" => {
                        return Some(TypeFact {
                            typ: Type::Other,
                            is_void: true,
                        })
                    }
                    "make" | "new" | "append" | "copy" | "recover" | "min" | "max" => {
                        return Some(TypeFact::of(Type::Other))
                    }
                    _ => {}
                }
                self.results_fact(self.scope.funcs.get(name))
            }
            Expr::Selector { name, .. } => {
                let name = name.clone();
                self.results_fact(self.scope.methods.get(&name))
            }
            Expr::Paren { inner } => {
                let inner = *inner;
                self.check_call(inner)
            }
            _ => None,
        }
    }

    fn results_fact(&self, results: Option<&Vec<Type>>) -> Option<TypeFact> {
        let results = results?;
        Some(match results.len() {
            0 => TypeFact {
                typ: Type::Other,
                is_void: true,
            },
            1 => TypeFact::of(results[0].clone()),
            _ => TypeFact::of(Type::Other),
        })
    }
}

/// Unbound untyped constants assume their default type.
fn defaulted(typ: &Type) -> Type {
    match typ {
        Type::Basic(k) => Type::Basic(k.default_type()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse_file;
    use std::path::PathBuf;

    fn check(src: &str) -> (SourceFile, TypeInfo) {
        let file = parse_file(&PathBuf::from("a.go"), src, 1).expect("parse");
        let mut infos = check_package(&[&file]);
        let info = infos.remove(0);
        (file, info)
    }

    /// Finds the statement list of the first function body.
    fn body_stmts(file: &SourceFile) -> Vec<StmtId> {
        for decl in &file.ast.decls {
            if let Decl::Func(f) = decl {
                if let Some(body) = f.body {
                    if let Stmt::Block { list } = file.ast.stmt(body) {
                        return list.clone();
                    }
                }
            }
        }
        panic!("no function body")
    }

    #[test]
    fn test_param_types_recorded_in_comparison() {
        let (file, info) = check(
            "package a\n\nfunc cmp(x float64, y float64) bool {\n\treturn x < y\n}\n",
        );
        let stmts = body_stmts(&file);
        let Stmt::Return { results } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        let Expr::Binary { lhs, rhs, .. } = file.ast.expr(results[0]) else {
            panic!()
        };
        assert_eq!(
            info.get(*lhs).unwrap().typ,
            Type::Basic(BasicKind::Float64)
        );
        assert_eq!(
            info.get(*rhs).unwrap().typ,
            Type::Basic(BasicKind::Float64)
        );
        assert_eq!(info.get(results[0]).unwrap().typ, Type::Basic(BasicKind::Bool));
    }

    #[test]
    fn test_untyped_literal_materializes_against_typed_side() {
        let (file, info) = check(
            "package a\n\nfunc f(x float32) bool {\n\treturn x < 2.5\n}\n",
        );
        let stmts = body_stmts(&file);
        let Stmt::Return { results } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        let Expr::Binary { rhs, .. } = file.ast.expr(results[0]) else {
            panic!()
        };
        assert_eq!(
            info.get(*rhs).unwrap().typ,
            Type::Basic(BasicKind::Float32)
        );
    }

    #[test]
    fn test_void_call_detection() {
        let (file, info) = check(
            "package a\n\nfunc Myy() {}\n\nfunc Mii() int {\n\treturn 1\n}\n\nfunc f() {\n\tMyy()\n\tMii()\n\tunknown.Call()\n}\n",
        );
        let stmts = body_stmts_of(&file, "f");
        let call_fact = |i: usize| {
            let Stmt::Expr { expr } = file.ast.stmt(stmts[i]) else {
                panic!()
            };
            info.get(*expr)
        };
        assert!(call_fact(0).unwrap().is_void);
        assert!(!call_fact(1).unwrap().is_void);
        assert!(call_fact(2).is_none(), "cross-package calls stay unknown");
    }

    fn body_stmts_of(file: &SourceFile, name: &str) -> Vec<StmtId> {
        for decl in &file.ast.decls {
            if let Decl::Func(f) = decl {
                if f.name == name {
                    if let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) {
                        return list.clone();
                    }
                }
            }
        }
        panic!("no function {name}")
    }

    #[test]
    fn test_define_infers_default_types() {
        let (file, info) = check(
            "package a\n\nfunc f() {\n\tb := 2\n\ts := \"x\"\n\tg := 2.0\n\t_, _, _ = b, s, g\n}\n",
        );
        let stmts = body_stmts(&file);
        let lhs_fact = |i: usize| {
            let Stmt::Assign { lhs, .. } = file.ast.stmt(stmts[i]) else {
                panic!()
            };
            info.get(lhs[0]).unwrap().typ.clone()
        };
        assert_eq!(lhs_fact(0), Type::Basic(BasicKind::Int));
        assert_eq!(lhs_fact(1), Type::Basic(BasicKind::Str));
        assert_eq!(lhs_fact(2), Type::Basic(BasicKind::Float64));
    }

    #[test]
    fn test_multi_value_define_from_call() {
        let (file, info) = check(
            "package a\n\nfunc Bar() (int, string) {\n\treturn 0, \"x\"\n}\n\nfunc f() {\n\tn, s := Bar()\n\t_, _ = n, s\n}\n",
        );
        let stmts = body_stmts_of(&file, "f");
        let Stmt::Assign { lhs, .. } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        assert_eq!(info.get(lhs[0]).unwrap().typ, Type::Basic(BasicKind::Int));
        assert_eq!(info.get(lhs[1]).unwrap().typ, Type::Basic(BasicKind::Str));
    }

    #[test]
    fn test_method_results_resolved_by_name() {
        let (file, info) = check(
            "package a\n\ntype A struct{}\n\nfunc (a A) Foo() int {\n\treturn 0\n}\n\nfunc f(a A) {\n\ta.Foo()\n}\n",
        );
        let stmts = body_stmts_of(&file, "f");
        let Stmt::Expr { expr } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        let fact = info.get(*expr).unwrap();
        assert!(!fact.is_void);
        assert_eq!(fact.typ, Type::Basic(BasicKind::Int));
    }

    #[test]
    fn test_string_concat_facts() {
        let (file, info) = check(
            "package a\n\nfunc f(s string, t string) string {\n\treturn s + t\n}\n",
        );
        let stmts = body_stmts(&file);
        let Stmt::Return { results } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        let Expr::Binary { lhs, .. } = file.ast.expr(results[0]) else {
            panic!()
        };
        assert!(info.get(*lhs).unwrap().typ.basic().unwrap().is_string());
        assert!(info
            .get(results[0])
            .unwrap()
            .typ
            .basic()
            .unwrap()
            .is_string());
    }

    #[test]
    fn test_conversion_call_has_target_type() {
        let (file, info) = check(
            "package a\n\nfunc f(i int, g float64) bool {\n\treturn float64(i) < g\n}\n",
        );
        let stmts = body_stmts(&file);
        let Stmt::Return { results } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        let Expr::Binary { lhs, .. } = file.ast.expr(results[0]) else {
            panic!()
        };
        assert_eq!(
            info.get(*lhs).unwrap().typ,
            Type::Basic(BasicKind::Float64)
        );
    }

    #[test]
    fn test_builtin_facts() {
        let (file, info) = check(
            "package a\n\nfunc f(s []int) {\n\tpanic(\"x\")\n\t_ = len(s)\n}\n",
        );
        let stmts = body_stmts(&file);
        let Stmt::Expr { expr } = file.ast.stmt(stmts[0]) else {
            panic!()
        };
        assert!(info.get(*expr).unwrap().is_void);
    }

    #[test]
    fn test_shadowing_in_nested_scopes() {
        let (file, info) = check(
            "package a\n\nfunc f(x int) {\n\tif true {\n\t\tx := \"s\"\n\t\t_ = x\n\t}\n\t_ = x\n}\n",
        );
        // The outer `_ = x` must still see the int parameter.
        let stmts = body_stmts(&file);
        let Stmt::Assign { rhs, .. } = file.ast.stmt(stmts[1]) else {
            panic!()
        };
        assert_eq!(info.get(rhs[0]).unwrap().typ, Type::Basic(BasicKind::Int));
    }
}
