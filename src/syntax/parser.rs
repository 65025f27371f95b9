//! Recursive-descent parser for the Go grammar subset.
//!
//! The grammar inventory is the one the mutation engine operates on; see
//! DESIGN.md for what is deliberately left out (generics, select, labels,
//! type switches). The sanity check runs `go build` on the target before any
//! parsing happens here, so a parse error means either an unsupported
//! construct (reported cleanly) or a restore bug upstream.

use super::ast::{
    Ast, BranchKind, ChanDir, Decl, DeclKind, Expr, ExprId, Field, FuncDecl, GenDecl,
    ImportSpec, InterfaceElem, SourceFile, Spec, Stmt, StmtId,
};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::lexer::Lexer;
use super::pos::Pos;
use super::token::{AssignOp, BinOp, Keyword, LitKind, Token, UnaryOp};
use std::path::Path;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token,
    pos: Pos,
    peeked: Option<(Token, Pos)>,
    ast: Ast,
    /// Non-zero inside if/for/switch headers, where a `{` after a bare type
    /// name opens the body, not a composite literal.
    no_composite: u32,
}

type PResult<T> = Result<T, SyntaxError>;

/// Parses one file. `base` is the file's offset base in the `FileSet`.
pub fn parse_file(path: &Path, src: &str, base: Pos) -> PResult<SourceFile> {
    let mut p = Parser::new(src, base)?;
    let pkg_name = p.parse_package_clause()?;
    p.parse_imports()?;
    while p.tok != Token::Eof {
        let decl = p.parse_decl()?;
        p.ast.decls.push(decl);
        p.eat_terminator()?;
    }
    Ok(SourceFile {
        path: path.to_path_buf(),
        pkg_name,
        ast: p.ast,
    })
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, base: Pos) -> PResult<Self> {
        let mut lexer = Lexer::new(src, base);
        let (tok, pos) = lexer.next_token()?;
        Ok(Self {
            lexer,
            tok,
            pos,
            peeked: None,
            ast: Ast::new(),
            no_composite: 0,
        })
    }

    fn advance(&mut self) -> PResult<()> {
        let (tok, pos) = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        self.tok = tok;
        self.pos = pos;
        Ok(())
    }

    fn peek(&mut self) -> PResult<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token()?);
        }
        Ok(&self.peeked.as_ref().unwrap().0)
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        SyntaxError::new(
            self.pos,
            SyntaxErrorKind::Unexpected {
                found: self.tok.describe(),
                expected: expected.to_string(),
            },
        )
    }

    fn unsupported(&self, what: &'static str) -> SyntaxError {
        SyntaxError::new(self.pos, SyntaxErrorKind::Unsupported(what))
    }

    fn expect(&mut self, tok: Token) -> PResult<Pos> {
        if self.tok == tok {
            let pos = self.pos;
            self.advance()?;
            Ok(pos)
        } else {
            Err(self.unexpected(&tok.describe()))
        }
    }

    fn accept(&mut self, tok: &Token) -> PResult<bool> {
        if &self.tok == tok {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Ident(name) => {
                self.advance()?;
                Ok(name)
            }
            other => {
                self.tok = other;
                Err(self.unexpected("identifier"))
            }
        }
    }

    /// A statement terminator: `;` (explicit or inserted). A closing brace
    /// or paren also terminates the last statement of its list.
    fn eat_terminator(&mut self) -> PResult<()> {
        if self.accept(&Token::Semi)? {
            return Ok(());
        }
        if matches!(self.tok, Token::RBrace | Token::RParen | Token::Eof) {
            return Ok(());
        }
        Err(self.unexpected("\";\""))
    }

    // ----- file structure -----

    fn parse_package_clause(&mut self) -> PResult<String> {
        self.expect(Token::Kw(Keyword::Package))?;
        let name = self.expect_ident()?;
        self.eat_terminator()?;
        Ok(name)
    }

    fn parse_imports(&mut self) -> PResult<()> {
        while self.tok == Token::Kw(Keyword::Import) {
            self.advance()?;
            if self.accept(&Token::LParen)? {
                while self.tok != Token::RParen {
                    let spec = self.parse_import_spec()?;
                    self.ast.imports.push(spec);
                    self.eat_terminator()?;
                }
                self.expect(Token::RParen)?;
            } else {
                let spec = self.parse_import_spec()?;
                self.ast.imports.push(spec);
            }
            self.eat_terminator()?;
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> PResult<ImportSpec> {
        let alias = match &self.tok {
            Token::Ident(name) => {
                let name = name.clone();
                self.advance()?;
                Some(name)
            }
            Token::Dot => return Err(self.unsupported("dot import")),
            _ => None,
        };
        match std::mem::replace(&mut self.tok, Token::Eof) {
            Token::Literal {
                kind: LitKind::String,
                text,
            } => {
                self.advance()?;
                Ok(ImportSpec { alias, path: text })
            }
            other => {
                self.tok = other;
                Err(self.unexpected("import path"))
            }
        }
    }

    // ----- declarations -----

    fn parse_decl(&mut self) -> PResult<Decl> {
        match self.tok {
            Token::Kw(Keyword::Func) => self.parse_func_decl().map(Decl::Func),
            Token::Kw(Keyword::Var) => self.parse_gen_decl(DeclKind::Var).map(Decl::Gen),
            Token::Kw(Keyword::Const) => self.parse_gen_decl(DeclKind::Const).map(Decl::Gen),
            Token::Kw(Keyword::Type) => self.parse_gen_decl(DeclKind::Type).map(Decl::Gen),
            _ => Err(self.unexpected("declaration")),
        }
    }

    fn parse_func_decl(&mut self) -> PResult<FuncDecl> {
        let pos = self.expect(Token::Kw(Keyword::Func))?;
        let recv = if self.tok == Token::LParen {
            let mut fields = self.parse_params()?;
            if fields.len() != 1 {
                return Err(self.unexpected("single receiver"));
            }
            Some(fields.remove(0))
        } else {
            None
        };
        let name = self.expect_ident()?;
        let params = self.parse_params()?;
        let results = self.parse_results()?;
        let body = if self.tok == Token::LBrace {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(FuncDecl {
            recv,
            name,
            params,
            results,
            body,
            pos,
        })
    }

    fn parse_gen_decl(&mut self, kind: DeclKind) -> PResult<GenDecl> {
        let pos = self.pos;
        self.advance()?;
        let mut specs = Vec::new();
        let grouped = self.accept(&Token::LParen)?;
        if grouped {
            while self.tok != Token::RParen {
                specs.push(self.parse_spec(kind)?);
                self.eat_terminator()?;
            }
            self.expect(Token::RParen)?;
        } else {
            specs.push(self.parse_spec(kind)?);
        }
        Ok(GenDecl {
            kind,
            specs,
            grouped,
            pos,
        })
    }

    fn parse_spec(&mut self, kind: DeclKind) -> PResult<Spec> {
        if kind == DeclKind::Type {
            let name = self.expect_ident()?;
            // `type T = U` aliases parse the same; the distinction does not
            // matter to any consumer here.
            self.accept(&Token::Assign)?;
            let typ = self.parse_type()?;
            return Ok(Spec {
                names: vec![name],
                typ: Some(typ),
                values: Vec::new(),
            });
        }
        let mut names = vec![self.expect_ident()?];
        while self.accept(&Token::Comma)? {
            names.push(self.expect_ident()?);
        }
        let typ = if !matches!(
            self.tok,
            Token::Assign | Token::Semi | Token::RParen | Token::Eof
        ) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.accept(&Token::Assign)? {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };
        Ok(Spec { names, typ, values })
    }

    // ----- signatures -----

    fn parse_params(&mut self) -> PResult<Vec<Field>> {
        self.expect(Token::LParen)?;
        let mut fields = Vec::new();
        while self.tok != Token::RParen {
            self.parse_param_group(&mut fields)?;
            if !self.accept(&Token::Comma)? {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(fields)
    }

    /// One comma-separated run that resolves to either a named group
    /// (`a, b int`) or a sequence of unnamed types (`int, string`).
    fn parse_param_group(&mut self, fields: &mut Vec<Field>) -> PResult<()> {
        let mut items: Vec<(ExprId, bool)> = Vec::new();
        loop {
            let variadic = self.accept(&Token::Ellipsis)?;
            let t = self.parse_type()?;
            items.push((t, variadic));
            if self.tok == Token::Comma && *self.peek()? != Token::RParen {
                // Could still be a named group; look at what follows the
                // next item before deciding. Parsing continues either way.
                self.advance()?;
                continue;
            }
            break;
        }
        if matches!(self.tok, Token::RParen | Token::Comma) {
            for (t, variadic) in items {
                let typ = if variadic {
                    self.ast.alloc_expr(Expr::Ellipsis { elem: Some(t) }, self.ast.expr_pos(t))
                } else {
                    t
                };
                fields.push(Field {
                    names: Vec::new(),
                    typ,
                    tag: None,
                });
            }
            return Ok(());
        }
        // A type follows: the items were names.
        let mut names = Vec::with_capacity(items.len());
        for (t, variadic) in items {
            if variadic {
                return Err(self.unexpected("parameter type"));
            }
            match self.ast.expr(t) {
                Expr::Ident(name) => names.push(name.clone()),
                _ => return Err(self.unexpected("parameter name")),
            }
        }
        let typ = if self.accept(&Token::Ellipsis)? {
            let elem = self.parse_type()?;
            self.ast.alloc_expr(Expr::Ellipsis { elem: Some(elem) }, self.ast.expr_pos(elem))
        } else {
            self.parse_type()?
        };
        fields.push(Field {
            names,
            typ,
            tag: None,
        });
        Ok(())
    }

    fn parse_results(&mut self) -> PResult<Vec<Field>> {
        if self.tok == Token::LParen {
            return self.parse_params();
        }
        if self.starts_type() {
            let typ = self.parse_type()?;
            return Ok(vec![Field {
                names: Vec::new(),
                typ,
                tag: None,
            }]);
        }
        Ok(Vec::new())
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.tok,
            Token::Ident(_)
                | Token::Star
                | Token::LBracket
                | Token::Kw(Keyword::Map)
                | Token::Kw(Keyword::Chan)
                | Token::Kw(Keyword::Struct)
                | Token::Kw(Keyword::Interface)
                | Token::Kw(Keyword::Func)
                | Token::Arrow
        )
    }

    // ----- types -----

    fn parse_type(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        match &self.tok {
            Token::Star => {
                self.advance()?;
                let operand = self.parse_type()?;
                Ok(self.ast.alloc_expr(Expr::Star { operand }, pos))
            }
            Token::LBracket => {
                self.advance()?;
                let len = if self.tok == Token::RBracket {
                    None
                } else if self.accept(&Token::Ellipsis)? {
                    Some(self.ast.alloc_expr(Expr::Ellipsis { elem: None }, pos))
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(Token::RBracket)?;
                let elem = self.parse_type()?;
                Ok(self.ast.alloc_expr(Expr::ArrayType { len, elem }, pos))
            }
            Token::Kw(Keyword::Map) => {
                self.advance()?;
                self.expect(Token::LBracket)?;
                let key = self.parse_type()?;
                self.expect(Token::RBracket)?;
                let value = self.parse_type()?;
                Ok(self.ast.alloc_expr(Expr::MapType { key, value }, pos))
            }
            Token::Kw(Keyword::Chan) => {
                self.advance()?;
                let dir = if self.accept(&Token::Arrow)? {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                Ok(self.ast.alloc_expr(Expr::ChanType { dir, elem }, pos))
            }
            Token::Arrow => {
                self.advance()?;
                self.expect(Token::Kw(Keyword::Chan))?;
                let elem = self.parse_type()?;
                Ok(self.ast.alloc_expr(
                    Expr::ChanType {
                        dir: ChanDir::Recv,
                        elem,
                    },
                    pos,
                ))
            }
            Token::Kw(Keyword::Struct) => self.parse_struct_type(),
            Token::Kw(Keyword::Interface) => self.parse_interface_type(),
            Token::Kw(Keyword::Func) => {
                self.advance()?;
                let params = self.parse_params()?;
                let results = self.parse_results()?;
                Ok(self.ast.alloc_expr(Expr::FuncType { params, results }, pos))
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_type()?;
                self.expect(Token::RParen)?;
                Ok(self.ast.alloc_expr(Expr::Paren { inner }, pos))
            }
            Token::Ident(_) => {
                let name = self.expect_ident()?;
                let mut e = self.ast.alloc_expr(Expr::Ident(name), pos);
                if self.tok == Token::Dot {
                    self.advance()?;
                    let sel = self.expect_ident()?;
                    e = self.ast.alloc_expr(Expr::Selector { base: e, name: sel }, pos);
                }
                Ok(e)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn parse_struct_type(&mut self) -> PResult<ExprId> {
        let pos = self.expect(Token::Kw(Keyword::Struct))?;
        self.expect(Token::LBrace)?;
        let mut fields = Vec::new();
        while self.tok != Token::RBrace {
            let field = self.parse_struct_field()?;
            fields.push(field);
            self.eat_terminator()?;
        }
        self.expect(Token::RBrace)?;
        Ok(self.ast.alloc_expr(Expr::StructType { fields }, pos))
    }

    fn parse_struct_field(&mut self) -> PResult<Field> {
        // Embedded fields: `T`, `*T`, `pkg.T`.
        if matches!(self.tok, Token::Star) {
            let typ = self.parse_type()?;
            let tag = self.parse_tag()?;
            return Ok(Field {
                names: Vec::new(),
                typ,
                tag,
            });
        }
        let first = self.expect_ident()?;
        if matches!(self.tok, Token::Semi | Token::RBrace | Token::Dot)
            || matches!(self.tok, Token::Literal { kind: LitKind::String, .. })
        {
            let pos = self.pos;
            let mut typ = self.ast.alloc_expr(Expr::Ident(first), pos);
            if self.accept(&Token::Dot)? {
                let sel = self.expect_ident()?;
                typ = self.ast.alloc_expr(Expr::Selector { base: typ, name: sel }, pos);
            }
            let tag = self.parse_tag()?;
            return Ok(Field {
                names: Vec::new(),
                typ,
                tag,
            });
        }
        let mut names = vec![first];
        while self.accept(&Token::Comma)? {
            names.push(self.expect_ident()?);
        }
        let typ = self.parse_type()?;
        let tag = self.parse_tag()?;
        Ok(Field { names, typ, tag })
    }

    fn parse_tag(&mut self) -> PResult<Option<String>> {
        if let Token::Literal {
            kind: LitKind::String,
            text,
        } = &self.tok
        {
            let tag = text.clone();
            self.advance()?;
            return Ok(Some(tag));
        }
        Ok(None)
    }

    fn parse_interface_type(&mut self) -> PResult<ExprId> {
        let pos = self.expect(Token::Kw(Keyword::Interface))?;
        self.expect(Token::LBrace)?;
        let mut elems = Vec::new();
        while self.tok != Token::RBrace {
            if matches!(self.tok, Token::Ident(_)) && *self.peek()? == Token::LParen {
                let name = self.expect_ident()?;
                let params = self.parse_params()?;
                let results = self.parse_results()?;
                elems.push(InterfaceElem::Method {
                    name,
                    params,
                    results,
                });
            } else {
                let typ = self.parse_type()?;
                elems.push(InterfaceElem::Embedded(typ));
            }
            self.eat_terminator()?;
        }
        self.expect(Token::RBrace)?;
        Ok(self.ast.alloc_expr(Expr::InterfaceType { elems }, pos))
    }

    // ----- statements -----

    fn parse_block(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::LBrace)?;
        let mut list = Vec::new();
        while self.tok != Token::RBrace {
            if self.tok == Token::Semi {
                self.advance()?;
                continue;
            }
            let stmt = self.parse_stmt()?;
            list.push(stmt);
            self.eat_terminator()?;
        }
        self.expect(Token::RBrace)?;
        Ok(self.ast.alloc_stmt(Stmt::Block { list }, pos))
    }

    fn parse_stmt(&mut self) -> PResult<StmtId> {
        let pos = self.pos;
        match self.tok {
            Token::Kw(Keyword::Var) => {
                let d = self.parse_gen_decl(DeclKind::Var)?;
                Ok(self.ast.alloc_stmt(Stmt::Decl(d), pos))
            }
            Token::Kw(Keyword::Const) => {
                let d = self.parse_gen_decl(DeclKind::Const)?;
                Ok(self.ast.alloc_stmt(Stmt::Decl(d), pos))
            }
            Token::Kw(Keyword::Type) => {
                let d = self.parse_gen_decl(DeclKind::Type)?;
                Ok(self.ast.alloc_stmt(Stmt::Decl(d), pos))
            }
            Token::Kw(Keyword::Return) => {
                self.advance()?;
                let results = if matches!(self.tok, Token::Semi | Token::RBrace) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                Ok(self.ast.alloc_stmt(Stmt::Return { results }, pos))
            }
            Token::Kw(Keyword::If) => self.parse_if(),
            Token::Kw(Keyword::Switch) => self.parse_switch(),
            Token::Kw(Keyword::For) => self.parse_for(),
            Token::Kw(Keyword::Break) => {
                self.advance()?;
                if matches!(self.tok, Token::Ident(_)) {
                    return Err(self.unsupported("labeled branch"));
                }
                Ok(self.ast.alloc_stmt(
                    Stmt::Branch {
                        kind: BranchKind::Break,
                    },
                    pos,
                ))
            }
            Token::Kw(Keyword::Continue) => {
                self.advance()?;
                if matches!(self.tok, Token::Ident(_)) {
                    return Err(self.unsupported("labeled branch"));
                }
                Ok(self.ast.alloc_stmt(
                    Stmt::Branch {
                        kind: BranchKind::Continue,
                    },
                    pos,
                ))
            }
            Token::Kw(Keyword::Fallthrough) => {
                self.advance()?;
                Ok(self.ast.alloc_stmt(
                    Stmt::Branch {
                        kind: BranchKind::Fallthrough,
                    },
                    pos,
                ))
            }
            Token::Kw(Keyword::Go) => {
                self.advance()?;
                let call = self.parse_expr()?;
                Ok(self.ast.alloc_stmt(Stmt::Go { call }, pos))
            }
            Token::Kw(Keyword::Defer) => {
                self.advance()?;
                let call = self.parse_expr()?;
                Ok(self.ast.alloc_stmt(Stmt::Defer { call }, pos))
            }
            Token::LBrace => self.parse_block(),
            Token::Semi => Ok(self.ast.alloc_stmt(Stmt::Empty, pos)),
            _ => {
                let simple = self.parse_simple(false)?;
                Ok(self.alloc_simple(simple))
            }
        }
    }

    fn alloc_simple(&mut self, simple: (Stmt, Pos)) -> StmtId {
        let (stmt, pos) = simple;
        self.ast.alloc_stmt(stmt, pos)
    }

    /// A simple statement: expression, send, inc/dec, or assignment.
    /// With `allow_range`, `x := range e` / `x, y = range e` productions are
    /// folded into a `Range` header for `parse_for`.
    fn parse_simple(&mut self, allow_range: bool) -> PResult<(Stmt, Pos)> {
        let pos = self.pos;
        if allow_range && self.accept(&Token::Kw(Keyword::Range))? {
            let expr = self.parse_expr()?;
            return Ok((
                Stmt::Range {
                    key: None,
                    value: None,
                    define: false,
                    expr,
                    body: StmtId::PLACEHOLDER,
                },
                pos,
            ));
        }
        let lhs = self.parse_expr_list()?;
        if let Some(op) = assign_op(&self.tok) {
            self.advance()?;
            if allow_range
                && matches!(op, AssignOp::Assign | AssignOp::Define)
                && self.accept(&Token::Kw(Keyword::Range))?
            {
                let expr = self.parse_expr()?;
                let mut iter = lhs.into_iter();
                return Ok((
                    Stmt::Range {
                        key: iter.next(),
                        value: iter.next(),
                        define: op == AssignOp::Define,
                        expr,
                        body: StmtId::PLACEHOLDER,
                    },
                    pos,
                ));
            }
            let rhs = self.parse_expr_list()?;
            return Ok((Stmt::Assign { lhs, op, rhs }, pos));
        }
        if lhs.len() != 1 {
            return Err(self.unexpected("assignment"));
        }
        let expr = lhs[0];
        match self.tok {
            Token::Arrow => {
                self.advance()?;
                let value = self.parse_expr()?;
                Ok((Stmt::Send { chan: expr, value }, pos))
            }
            Token::Inc => {
                self.advance()?;
                Ok((Stmt::IncDec { expr, inc: true }, pos))
            }
            Token::Dec => {
                self.advance()?;
                Ok((Stmt::IncDec { expr, inc: false }, pos))
            }
            Token::Colon => Err(self.unsupported("labeled statement")),
            _ => Ok((Stmt::Expr { expr }, pos)),
        }
    }

    fn parse_if(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Kw(Keyword::If))?;
        self.no_composite += 1;
        let (init, cond) = self.parse_if_header()?;
        self.no_composite -= 1;
        let body = self.parse_block()?;
        let els = if self.accept(&Token::Kw(Keyword::Else))? {
            if self.tok == Token::Kw(Keyword::If) {
                Some(self.parse_if()?)
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(self.ast.alloc_stmt(
            Stmt::If {
                init,
                cond,
                body,
                els,
            },
            pos,
        ))
    }

    fn parse_if_header(&mut self) -> PResult<(Option<StmtId>, ExprId)> {
        let simple = self.parse_simple(false)?;
        if self.tok == Token::Semi {
            let init = self.alloc_simple(simple);
            self.advance()?;
            let cond = self.parse_expr()?;
            Ok((Some(init), cond))
        } else {
            match simple.0 {
                Stmt::Expr { expr } => Ok((None, expr)),
                _ => Err(self.unexpected("condition expression")),
            }
        }
    }

    fn parse_switch(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Kw(Keyword::Switch))?;
        self.no_composite += 1;
        let (init, tag) = if self.tok == Token::LBrace {
            (None, None)
        } else {
            let simple = self.parse_simple(false)?;
            if self.tok == Token::Semi {
                let init = self.alloc_simple(simple);
                self.advance()?;
                if self.tok == Token::LBrace {
                    (Some(init), None)
                } else {
                    let tag = self.parse_expr()?;
                    (Some(init), Some(tag))
                }
            } else {
                match simple.0 {
                    Stmt::Expr { expr } => (None, Some(expr)),
                    _ => return Err(self.unexpected("switch tag")),
                }
            }
        };
        self.no_composite -= 1;
        self.expect(Token::LBrace)?;
        let mut cases = Vec::new();
        while self.tok != Token::RBrace {
            cases.push(self.parse_case_clause()?);
        }
        self.expect(Token::RBrace)?;
        Ok(self.ast.alloc_stmt(Stmt::Switch { init, tag, cases }, pos))
    }

    fn parse_case_clause(&mut self) -> PResult<StmtId> {
        let pos = self.pos;
        let guards = if self.accept(&Token::Kw(Keyword::Case))? {
            self.parse_expr_list()?
        } else {
            self.expect(Token::Kw(Keyword::Default))?;
            Vec::new()
        };
        self.expect(Token::Colon)?;
        let mut body = Vec::new();
        while !matches!(
            self.tok,
            Token::Kw(Keyword::Case) | Token::Kw(Keyword::Default) | Token::RBrace
        ) {
            if self.tok == Token::Semi {
                self.advance()?;
                continue;
            }
            let stmt = self.parse_stmt()?;
            body.push(stmt);
            if !self.accept(&Token::Semi)? {
                break;
            }
        }
        Ok(self.ast.alloc_stmt(Stmt::Case { guards, body }, pos))
    }

    fn parse_for(&mut self) -> PResult<StmtId> {
        let pos = self.expect(Token::Kw(Keyword::For))?;
        self.no_composite += 1;
        if self.tok == Token::LBrace {
            self.no_composite -= 1;
            let body = self.parse_block()?;
            return Ok(self.ast.alloc_stmt(
                Stmt::For {
                    init: None,
                    cond: None,
                    post: None,
                    body,
                },
                pos,
            ));
        }
        // `for init; cond; post {` with any part empty, `for cond {`, or a
        // range clause.
        if self.tok == Token::Semi {
            self.advance()?;
            let cond = if self.tok == Token::Semi {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(Token::Semi)?;
            let post = if self.tok == Token::LBrace {
                None
            } else {
                let simple = self.parse_simple(false)?;
                Some(self.alloc_simple(simple))
            };
            self.no_composite -= 1;
            let body = self.parse_block()?;
            return Ok(self.ast.alloc_stmt(
                Stmt::For {
                    init: None,
                    cond,
                    post,
                    body,
                },
                pos,
            ));
        }
        let simple = self.parse_simple(true)?;
        if let (Stmt::Range {
            key,
            value,
            define,
            expr,
            ..
        }, rpos) = (&simple.0, simple.1)
        {
            let (key, value, define, expr) = (*key, *value, *define, *expr);
            self.no_composite -= 1;
            let body = self.parse_block()?;
            return Ok(self.ast.alloc_stmt(
                Stmt::Range {
                    key,
                    value,
                    define,
                    expr,
                    body,
                },
                rpos,
            ));
        }
        if self.tok == Token::Semi {
            let init = self.alloc_simple(simple);
            self.advance()?;
            let cond = if self.tok == Token::Semi {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(Token::Semi)?;
            let post = if self.tok == Token::LBrace {
                None
            } else {
                let p = self.parse_simple(false)?;
                Some(self.alloc_simple(p))
            };
            self.no_composite -= 1;
            let body = self.parse_block()?;
            return Ok(self.ast.alloc_stmt(
                Stmt::For {
                    init: Some(init),
                    cond,
                    post,
                    body,
                },
                pos,
            ));
        }
        let cond = match simple.0 {
            Stmt::Expr { expr } => expr,
            _ => return Err(self.unexpected("loop condition")),
        };
        self.no_composite -= 1;
        let body = self.parse_block()?;
        Ok(self.ast.alloc_stmt(
            Stmt::For {
                init: None,
                cond: Some(cond),
                post: None,
                body,
            },
            pos,
        ))
    }

    // ----- expressions -----

    fn parse_expr_list(&mut self) -> PResult<Vec<ExprId>> {
        let mut list = vec![self.parse_expr()?];
        while self.accept(&Token::Comma)? {
            list.push(self.parse_expr()?);
        }
        Ok(list)
    }

    pub fn parse_expr(&mut self) -> PResult<ExprId> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> PResult<ExprId> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = bin_op(&self.tok) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            let pos = self.ast.expr_pos(lhs);
            self.advance()?;
            let rhs = self.parse_binary(prec + 1)?;
            lhs = self.ast.alloc_expr(Expr::Binary { lhs, op, rhs }, pos);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        let op = match self.tok {
            Token::Not => Some(UnaryOp::Not),
            Token::Minus => Some(UnaryOp::Neg),
            Token::Plus => Some(UnaryOp::Plus),
            Token::Caret => Some(UnaryOp::BitNot),
            Token::Amp => Some(UnaryOp::Addr),
            Token::Arrow => {
                // `<-chan T` is a type; `<-ch` is a receive.
                if *self.peek()? == Token::Kw(Keyword::Chan) {
                    return self.parse_type();
                }
                Some(UnaryOp::Recv)
            }
            Token::Star => {
                self.advance()?;
                let operand = self.parse_unary()?;
                return Ok(self.ast.alloc_expr(Expr::Star { operand }, pos));
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(self.ast.alloc_expr(Expr::Unary { op, operand }, pos));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<ExprId> {
        let mut e = self.parse_operand()?;
        loop {
            match self.tok {
                Token::Dot => {
                    let pos = self.ast.expr_pos(e);
                    self.advance()?;
                    if self.accept(&Token::LParen)? {
                        if self.tok == Token::Kw(Keyword::Type) {
                            return Err(self.unsupported("type switch"));
                        }
                        let typ = self.parse_type()?;
                        self.expect(Token::RParen)?;
                        e = self.ast.alloc_expr(Expr::TypeAssert { base: e, typ }, pos);
                    } else {
                        let name = self.expect_ident()?;
                        e = self.ast.alloc_expr(Expr::Selector { base: e, name }, pos);
                    }
                }
                Token::LParen => {
                    let pos = self.ast.expr_pos(e);
                    self.advance()?;
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while self.tok != Token::RParen {
                        let save = self.no_composite;
                        self.no_composite = 0;
                        let arg = self.parse_expr()?;
                        self.no_composite = save;
                        args.push(arg);
                        if self.accept(&Token::Ellipsis)? {
                            ellipsis = true;
                        }
                        if !self.accept(&Token::Comma)? {
                            break;
                        }
                    }
                    self.expect(Token::RParen)?;
                    e = self.ast.alloc_expr(
                        Expr::Call {
                            fun: e,
                            args,
                            ellipsis,
                        },
                        pos,
                    );
                }
                Token::LBracket => {
                    let pos = self.ast.expr_pos(e);
                    self.advance()?;
                    let save = self.no_composite;
                    self.no_composite = 0;
                    let low = if matches!(self.tok, Token::Colon) {
                        None
                    } else {
                        Some(self.parse_expr()?)
                    };
                    if self.accept(&Token::Colon)? {
                        let high = if matches!(self.tok, Token::RBracket | Token::Colon) {
                            None
                        } else {
                            Some(self.parse_expr()?)
                        };
                        let max = if self.accept(&Token::Colon)? {
                            Some(self.parse_expr()?)
                        } else {
                            None
                        };
                        self.no_composite = save;
                        self.expect(Token::RBracket)?;
                        e = self.ast.alloc_expr(
                            Expr::Slice {
                                base: e,
                                low,
                                high,
                                max,
                            },
                            pos,
                        );
                    } else {
                        self.no_composite = save;
                        self.expect(Token::RBracket)?;
                        let Some(index) = low else {
                            return Err(self.unexpected("index expression"));
                        };
                        e = self.ast.alloc_expr(Expr::Index { base: e, index }, pos);
                    }
                }
                Token::LBrace if self.composite_allowed(e) => {
                    e = self.parse_composite_body(Some(e))?;
                }
                _ => return Ok(e),
            }
        }
    }

    /// Composite literals after a bare type name are suppressed inside
    /// if/for/switch headers; literals whose type is written out with a
    /// keyword (`[]T{}`, `map[K]V{}`, `struct{...}{}`) are unambiguous and
    /// always allowed.
    fn composite_allowed(&self, typ: ExprId) -> bool {
        match self.ast.expr(typ) {
            Expr::Ident(_) | Expr::Selector { .. } => self.no_composite == 0,
            Expr::ArrayType { .. }
            | Expr::MapType { .. }
            | Expr::StructType { .. }
            | Expr::InterfaceType { .. } => true,
            _ => false,
        }
    }

    fn parse_composite_body(&mut self, typ: Option<ExprId>) -> PResult<ExprId> {
        let pos = typ
            .map(|t| self.ast.expr_pos(t))
            .unwrap_or(self.pos);
        self.expect(Token::LBrace)?;
        let save = self.no_composite;
        self.no_composite = 0;
        let mut elems = Vec::new();
        while self.tok != Token::RBrace {
            let elem = self.parse_composite_elem()?;
            elems.push(elem);
            if !self.accept(&Token::Comma)? {
                // A newline before `}` inserts a semicolon.
                self.accept(&Token::Semi)?;
                break;
            }
            self.accept(&Token::Semi)?;
        }
        self.no_composite = save;
        self.expect(Token::RBrace)?;
        Ok(self.ast.alloc_expr(Expr::Composite { typ, elems }, pos))
    }

    fn parse_composite_elem(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        let value = if self.tok == Token::LBrace {
            // Nested literal with elided type.
            self.parse_composite_body(None)?
        } else {
            self.parse_expr()?
        };
        if self.accept(&Token::Colon)? {
            let v = if self.tok == Token::LBrace {
                self.parse_composite_body(None)?
            } else {
                self.parse_expr()?
            };
            return Ok(self.ast.alloc_expr(
                Expr::KeyValue {
                    key: value,
                    value: v,
                },
                pos,
            ));
        }
        Ok(value)
    }

    fn parse_operand(&mut self) -> PResult<ExprId> {
        let pos = self.pos;
        match &self.tok {
            Token::Ident(_) => {
                let name = self.expect_ident()?;
                Ok(self.ast.alloc_expr(Expr::Ident(name), pos))
            }
            Token::Literal { .. } => {
                let Token::Literal { kind, text } = std::mem::replace(&mut self.tok, Token::Eof)
                else {
                    unreachable!()
                };
                self.advance()?;
                Ok(self.ast.alloc_expr(Expr::Lit { kind, text }, pos))
            }
            Token::LParen => {
                self.advance()?;
                let save = self.no_composite;
                self.no_composite = 0;
                let inner = self.parse_expr()?;
                self.no_composite = save;
                self.expect(Token::RParen)?;
                Ok(self.ast.alloc_expr(Expr::Paren { inner }, pos))
            }
            Token::Kw(Keyword::Func) => {
                self.advance()?;
                let params = self.parse_params()?;
                let results = self.parse_results()?;
                if self.tok == Token::LBrace {
                    let body = self.parse_block()?;
                    Ok(self.ast.alloc_expr(
                        Expr::FuncLit {
                            params,
                            results,
                            body,
                        },
                        pos,
                    ))
                } else {
                    Ok(self.ast.alloc_expr(Expr::FuncType { params, results }, pos))
                }
            }
            Token::LBracket
            | Token::Kw(Keyword::Map)
            | Token::Kw(Keyword::Chan)
            | Token::Kw(Keyword::Struct)
            | Token::Kw(Keyword::Interface)
            | Token::Star => self.parse_type(),
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn bin_op(tok: &Token) -> Option<BinOp> {
    Some(match tok {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Quo,
        Token::Percent => BinOp::Rem,
        Token::Amp => BinOp::And,
        Token::Pipe => BinOp::Or,
        Token::Caret => BinOp::Xor,
        Token::AmpCaret => BinOp::AndNot,
        Token::Shl => BinOp::Shl,
        Token::Shr => BinOp::Shr,
        Token::AndAnd => BinOp::LAnd,
        Token::OrOr => BinOp::LOr,
        Token::Eq => BinOp::Eql,
        Token::Ne => BinOp::Neq,
        Token::Lt => BinOp::Lss,
        Token::Le => BinOp::Leq,
        Token::Gt => BinOp::Gtr,
        Token::Ge => BinOp::Geq,
        _ => return None,
    })
}

fn assign_op(tok: &Token) -> Option<AssignOp> {
    Some(match tok {
        Token::Assign => AssignOp::Assign,
        Token::Define => AssignOp::Define,
        Token::PlusEq => AssignOp::AddAssign,
        Token::MinusEq => AssignOp::SubAssign,
        Token::StarEq => AssignOp::MulAssign,
        Token::SlashEq => AssignOp::QuoAssign,
        Token::PercentEq => AssignOp::RemAssign,
        Token::AmpEq => AssignOp::AndAssign,
        Token::PipeEq => AssignOp::OrAssign,
        Token::CaretEq => AssignOp::XorAssign,
        Token::AmpCaretEq => AssignOp::AndNotAssign,
        Token::ShlEq => AssignOp::ShlAssign,
        Token::ShrEq => AssignOp::ShrAssign,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> SourceFile {
        parse_file(&PathBuf::from("a.go"), src, 1).expect("parse")
    }

    #[test]
    fn test_minimal_file() {
        let file = parse("package a\n");
        assert_eq!(file.pkg_name, "a");
        assert!(file.ast.decls.is_empty());
    }

    #[test]
    fn test_imports() {
        let file = parse("package a\n\nimport (\n\t\"fmt\"\n\tio \"io\"\n)\n");
        assert_eq!(file.ast.imports.len(), 2);
        assert_eq!(file.ast.imports[0].path, "\"fmt\"");
        assert_eq!(file.ast.imports[1].alias.as_deref(), Some("io"));
    }

    #[test]
    fn test_func_with_if_else() {
        let file = parse(
            "package a\n\nfunc abs(x int) int {\n\tif x > 0 {\n\t\treturn x\n\t} else {\n\t\treturn -x\n\t}\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!("expected func")
        };
        assert_eq!(f.name, "abs");
        assert_eq!(f.params.len(), 1);
        assert_eq!(f.results.len(), 1);
        let body = f.body.expect("body");
        let Stmt::Block { list } = file.ast.stmt(body) else {
            panic!("expected block")
        };
        let Stmt::If { cond, els, .. } = file.ast.stmt(list[0]) else {
            panic!("expected if")
        };
        let Expr::Binary { op, .. } = file.ast.expr(*cond) else {
            panic!("expected binary cond")
        };
        assert_eq!(*op, BinOp::Gtr);
        assert!(els.is_some());
    }

    #[test]
    fn test_switch_with_cases() {
        let file = parse(
            "package a\n\nfunc choose(a int) string {\n\tswitch a {\n\tcase 1:\n\t\treturn \"x\"\n\tcase 2:\n\t\treturn \"y\"\n\tdefault:\n\t\treturn \"z\"\n\t}\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) else {
            panic!()
        };
        let Stmt::Switch { tag, cases, .. } = file.ast.stmt(list[0]) else {
            panic!("expected switch")
        };
        assert!(tag.is_some());
        assert_eq!(cases.len(), 3);
        let Stmt::Case { guards, body } = file.ast.stmt(cases[2]) else {
            panic!()
        };
        assert!(guards.is_empty());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_precedence() {
        let file = parse("package a\n\nvar x = 1 + 2*3\n");
        let Decl::Gen(g) = &file.ast.decls[0] else {
            panic!()
        };
        let v = g.specs[0].values[0];
        let Expr::Binary { op, rhs, .. } = file.ast.expr(v) else {
            panic!()
        };
        assert_eq!(*op, BinOp::Add);
        let Expr::Binary { op, .. } = file.ast.expr(*rhs) else {
            panic!("rhs should be the product")
        };
        assert_eq!(*op, BinOp::Mul);
    }

    #[test]
    fn test_assignments() {
        let file = parse(
            "package a\n\nfunc f() {\n\tb := 2\n\tb -= 0\n\ta, c := 1, 2\n\t_, _ = a, c\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) else {
            panic!()
        };
        assert_eq!(list.len(), 4);
        let Stmt::Assign { op, .. } = file.ast.stmt(list[1]) else {
            panic!()
        };
        assert_eq!(*op, AssignOp::SubAssign);
    }

    #[test]
    fn test_for_variants() {
        let src = "package a\n\nfunc f(n int) {\n\tfor {\n\t\tbreak\n\t}\n\tfor n > 0 {\n\t\tn--\n\t}\n\tfor i := 0; i < n; i++ {\n\t\tcontinue\n\t}\n\tfor k, v := range m {\n\t\t_, _ = k, v\n\t}\n}\n";
        let file = parse(src);
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) else {
            panic!()
        };
        assert!(matches!(file.ast.stmt(list[0]), Stmt::For { cond: None, .. }));
        assert!(matches!(
            file.ast.stmt(list[1]),
            Stmt::For {
                cond: Some(_),
                init: None,
                ..
            }
        ));
        assert!(matches!(
            file.ast.stmt(list[2]),
            Stmt::For {
                init: Some(_),
                cond: Some(_),
                post: Some(_),
                ..
            }
        ));
        assert!(matches!(
            file.ast.stmt(list[3]),
            Stmt::Range {
                define: true,
                key: Some(_),
                value: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_composite_suppressed_in_header() {
        // `T{}` directly in an if header must not parse as a literal.
        let file = parse(
            "package a\n\nfunc f(a A) bool {\n\tif a == (A{}) {\n\t\treturn true\n\t}\n\treturn false\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        assert!(f.body.is_some());
    }

    #[test]
    fn test_struct_and_interface_decls() {
        let src = "package a\n\ntype A struct{}\n\ntype B struct {\n\tx int\n\ty, z string\n}\n\ntype Fooer interface {\n\tFoo() int\n}\n";
        let file = parse(src);
        assert_eq!(file.ast.decls.len(), 3);
        let Decl::Gen(g) = &file.ast.decls[1] else {
            panic!()
        };
        let Expr::StructType { fields } = file.ast.expr(g.specs[0].typ.unwrap()) else {
            panic!()
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].names, vec!["y".to_string(), "z".to_string()]);
        let Decl::Gen(g) = &file.ast.decls[2] else {
            panic!()
        };
        let Expr::InterfaceType { elems } = file.ast.expr(g.specs[0].typ.unwrap()) else {
            panic!()
        };
        assert_eq!(elems.len(), 1);
    }

    #[test]
    fn test_method_decl_with_receiver() {
        let file = parse("package a\n\nfunc (a *A) Foo() int {\n\treturn 0\n}\n");
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let recv = f.recv.as_ref().unwrap();
        assert_eq!(recv.names, vec!["a".to_string()]);
        assert!(matches!(file.ast.expr(recv.typ), Expr::Star { .. }));
    }

    #[test]
    fn test_send_and_incdec() {
        let file = parse("package a\n\nfunc f(ch chan bool, x float64, y float64) {\n\tch <- x < y\n\tn := 0\n\tn++\n}\n");
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) else {
            panic!()
        };
        assert!(matches!(file.ast.stmt(list[0]), Stmt::Send { .. }));
        assert!(matches!(file.ast.stmt(list[2]), Stmt::IncDec { inc: true, .. }));
    }

    #[test]
    fn test_func_literal() {
        let file = parse(
            "package a\n\nfunc f() {\n\tg := func(x int) int {\n\t\treturn x + 1\n\t}\n\t_ = g\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        assert!(f.body.is_some());
    }

    #[test]
    fn test_composite_literals() {
        let file = parse(
            "package a\n\nvar m = map[string]int{\"a\": 1, \"b\": 2}\n\nvar s = []int{1, 2, 3}\n\nvar p = A{x: 1}\n",
        );
        assert_eq!(file.ast.decls.len(), 3);
    }

    #[test]
    fn test_unsupported_label_reports_cleanly() {
        let err = parse_file(
            &PathBuf::from("a.go"),
            "package a\n\nfunc f() {\nloop:\n\tfor {\n\t}\n}\n",
            1,
        )
        .unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::Unsupported(_)));
    }

    #[test]
    fn test_variadic_params_and_call() {
        let file = parse("package a\n\nfunc f(xs ...int) {\n\tf(xs...)\n}\n");
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        assert!(matches!(
            file.ast.expr(f.params[0].typ),
            Expr::Ellipsis { elem: Some(_) }
        ));
    }

    #[test]
    fn test_multi_result_signature() {
        let file = parse("package a\n\nfunc Bar() (int, int) {\n\treturn 0, 1\n}\n");
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        assert_eq!(f.results.len(), 2);
    }

    #[test]
    fn test_if_with_init() {
        let file = parse(
            "package a\n\nfunc f() int {\n\tif n := g(); n > 0 {\n\t\treturn n\n\t}\n\treturn 0\n}\n",
        );
        let Decl::Func(f) = &file.ast.decls[0] else {
            panic!()
        };
        let Stmt::Block { list } = file.ast.stmt(f.body.unwrap()) else {
            panic!()
        };
        assert!(matches!(
            file.ast.stmt(list[0]),
            Stmt::If { init: Some(_), .. }
        ));
    }
}
