//! Handwritten lexer for the Go grammar subset.
//!
//! Implements Go's automatic semicolon insertion: a newline (or a block
//! comment spanning one, or end of input) terminates the statement when the
//! previous token could end one.

use super::error::{SyntaxError, SyntaxErrorKind};
use super::pos::Pos;
use super::token::{Keyword, LitKind, Token};
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
    base: Pos,
    /// Last significant token, for semicolon insertion.
    last: Option<Token>,
    eof_semi_done: bool,
}

impl<'a> Lexer<'a> {
    /// `base` is the offset the file was registered at in the `FileSet`.
    pub fn new(src: &'a str, base: Pos) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            base,
            last: None,
            eof_semi_done: false,
        }
    }

    fn err(&self, at: usize, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(self.base + at as Pos, kind)
    }

    fn peek_char(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    /// True when the char after the peeked one equals `c` (used for the
    /// three-char operators).
    fn second_is(&mut self, from: usize, c: char) -> bool {
        self.src[from..].chars().nth(1) == Some(c)
    }

    fn token(&mut self, at: usize, tok: Token) -> (Token, Pos) {
        self.last = Some(tok.clone());
        (tok, self.base + at as Pos)
    }

    /// Produces the next token, inserting semicolons per the newline rule.
    pub fn next_token(&mut self) -> Result<(Token, Pos), SyntaxError> {
        loop {
            let Some((at, c)) = self.peek_char() else {
                if !self.eof_semi_done {
                    self.eof_semi_done = true;
                    if self.last.as_ref().is_some_and(Token::ends_statement) {
                        let at = self.src.len();
                        return Ok(self.token(at, Token::Semi));
                    }
                }
                return Ok((Token::Eof, self.base + self.src.len() as Pos));
            };
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '\n' => {
                    self.bump();
                    if self.last.as_ref().is_some_and(Token::ends_statement) {
                        return Ok(self.token(at, Token::Semi));
                    }
                }
                '/' if self.second_is(at, '/') => {
                    while let Some((_, c)) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if self.second_is(at, '*') => {
                    self.bump();
                    self.bump();
                    let mut newline = false;
                    loop {
                        match self.bump() {
                            Some((_, '\n')) => newline = true,
                            Some((_, '*')) if self.peek_char().map(|p| p.1) == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.err(at, SyntaxErrorKind::UnterminatedComment))
                            }
                        }
                    }
                    if newline && self.last.as_ref().is_some_and(Token::ends_statement) {
                        return Ok(self.token(at, Token::Semi));
                    }
                }
                _ => return self.lex_token(at, c),
            }
        }
    }

    fn lex_token(&mut self, at: usize, c: char) -> Result<(Token, Pos), SyntaxError> {
        if c.is_alphabetic() || c == '_' {
            return Ok(self.lex_word(at));
        }
        if c.is_ascii_digit() {
            return self.lex_number(at);
        }
        if c == '.' && self.src[at + 1..].starts_with(|d: char| d.is_ascii_digit()) {
            return self.lex_number(at);
        }
        match c {
            '"' => self.lex_string(at),
            '`' => self.lex_raw_string(at),
            '\'' => self.lex_char(at),
            _ => self.lex_operator(at, c),
        }
    }

    fn lex_word(&mut self, at: usize) -> (Token, Pos) {
        let mut end = at;
        while let Some((i, c)) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                end = i + c.len_utf8();
                self.bump();
            } else {
                break;
            }
        }
        let word = &self.src[at..end];
        let tok = match Keyword::from_word(word) {
            Some(kw) => Token::Kw(kw),
            None => Token::Ident(word.to_string()),
        };
        self.token(at, tok)
    }

    fn lex_number(&mut self, at: usize) -> Result<(Token, Pos), SyntaxError> {
        let mut end = at;
        let mut kind = LitKind::Int;
        let radix_prefix = self.src[at..].starts_with("0x")
            || self.src[at..].starts_with("0X")
            || self.src[at..].starts_with("0b")
            || self.src[at..].starts_with("0B")
            || self.src[at..].starts_with("0o")
            || self.src[at..].starts_with("0O");
        if radix_prefix {
            self.bump();
            self.bump();
            end = at + 2;
            let mut any = false;
            while let Some((i, c)) = self.peek_char() {
                if c.is_ascii_hexdigit() || c == '_' {
                    any = true;
                    end = i + 1;
                    self.bump();
                } else {
                    break;
                }
            }
            if !any {
                return Err(self.err(at, SyntaxErrorKind::MalformedNumber));
            }
            return Ok(self.token(at, Token::Literal {
                kind: LitKind::Int,
                text: self.src[at..end].to_string(),
            }));
        }

        let eat_digits = |lex: &mut Self, end: &mut usize| {
            while let Some((i, c)) = lex.peek_char() {
                if c.is_ascii_digit() || c == '_' {
                    *end = i + 1;
                    lex.bump();
                } else {
                    break;
                }
            }
        };

        eat_digits(self, &mut end);
        if let Some((i, '.')) = self.peek_char() {
            // Not the start of a `...` or a selector on a literal.
            if self.src[i + 1..].starts_with(|d: char| d.is_ascii_digit())
                || !self.src[i + 1..].starts_with('.')
            {
                kind = LitKind::Float;
                end = i + 1;
                self.bump();
                eat_digits(self, &mut end);
            }
        }
        if let Some((i, c)) = self.peek_char() {
            if c == 'e' || c == 'E' {
                kind = LitKind::Float;
                end = i + 1;
                self.bump();
                if let Some((j, s)) = self.peek_char() {
                    if s == '+' || s == '-' {
                        end = j + 1;
                        self.bump();
                    }
                }
                let before = end;
                eat_digits(self, &mut end);
                if end == before {
                    return Err(self.err(at, SyntaxErrorKind::MalformedNumber));
                }
            }
        }
        if let Some((i, 'i')) = self.peek_char() {
            kind = LitKind::Imag;
            end = i + 1;
            self.bump();
        }
        Ok(self.token(at, Token::Literal {
            kind,
            text: self.src[at..end].to_string(),
        }))
    }

    fn lex_string(&mut self, at: usize) -> Result<(Token, Pos), SyntaxError> {
        self.bump();
        loop {
            match self.bump() {
                Some((_, '\\')) => {
                    self.bump();
                }
                Some((i, '"')) => {
                    return Ok(self.token(at, Token::Literal {
                        kind: LitKind::String,
                        text: self.src[at..=i].to_string(),
                    }));
                }
                Some((_, '\n')) | None => {
                    return Err(self.err(at, SyntaxErrorKind::UnterminatedString))
                }
                Some(_) => {}
            }
        }
    }

    fn lex_raw_string(&mut self, at: usize) -> Result<(Token, Pos), SyntaxError> {
        self.bump();
        loop {
            match self.bump() {
                Some((i, '`')) => {
                    return Ok(self.token(at, Token::Literal {
                        kind: LitKind::String,
                        text: self.src[at..=i].to_string(),
                    }));
                }
                None => return Err(self.err(at, SyntaxErrorKind::UnterminatedString)),
                Some(_) => {}
            }
        }
    }

    fn lex_char(&mut self, at: usize) -> Result<(Token, Pos), SyntaxError> {
        self.bump();
        loop {
            match self.bump() {
                Some((_, '\\')) => {
                    self.bump();
                }
                Some((i, '\'')) => {
                    return Ok(self.token(at, Token::Literal {
                        kind: LitKind::Char,
                        text: self.src[at..=i].to_string(),
                    }));
                }
                Some((_, '\n')) | None => {
                    return Err(self.err(at, SyntaxErrorKind::UnterminatedChar))
                }
                Some(_) => {}
            }
        }
    }

    fn lex_operator(&mut self, at: usize, c: char) -> Result<(Token, Pos), SyntaxError> {
        self.bump();
        let next = self.peek_char().map(|p| p.1);
        let tok = match c {
            '+' => match next {
                Some('=') => self.two(Token::PlusEq),
                Some('+') => self.two(Token::Inc),
                _ => Token::Plus,
            },
            '-' => match next {
                Some('=') => self.two(Token::MinusEq),
                Some('-') => self.two(Token::Dec),
                _ => Token::Minus,
            },
            '*' => match next {
                Some('=') => self.two(Token::StarEq),
                _ => Token::Star,
            },
            '/' => match next {
                Some('=') => self.two(Token::SlashEq),
                _ => Token::Slash,
            },
            '%' => match next {
                Some('=') => self.two(Token::PercentEq),
                _ => Token::Percent,
            },
            '&' => match next {
                Some('&') => self.two(Token::AndAnd),
                Some('=') => self.two(Token::AmpEq),
                Some('^') => {
                    self.bump();
                    if self.peek_char().map(|p| p.1) == Some('=') {
                        self.bump();
                        Token::AmpCaretEq
                    } else {
                        Token::AmpCaret
                    }
                }
                _ => Token::Amp,
            },
            '|' => match next {
                Some('|') => self.two(Token::OrOr),
                Some('=') => self.two(Token::PipeEq),
                _ => Token::Pipe,
            },
            '^' => match next {
                Some('=') => self.two(Token::CaretEq),
                _ => Token::Caret,
            },
            '<' => match next {
                Some('<') => {
                    self.bump();
                    if self.peek_char().map(|p| p.1) == Some('=') {
                        self.bump();
                        Token::ShlEq
                    } else {
                        Token::Shl
                    }
                }
                Some('=') => self.two(Token::Le),
                Some('-') => self.two(Token::Arrow),
                _ => Token::Lt,
            },
            '>' => match next {
                Some('>') => {
                    self.bump();
                    if self.peek_char().map(|p| p.1) == Some('=') {
                        self.bump();
                        Token::ShrEq
                    } else {
                        Token::Shr
                    }
                }
                Some('=') => self.two(Token::Ge),
                _ => Token::Gt,
            },
            '=' => match next {
                Some('=') => self.two(Token::Eq),
                _ => Token::Assign,
            },
            '!' => match next {
                Some('=') => self.two(Token::Ne),
                _ => Token::Not,
            },
            ':' => match next {
                Some('=') => self.two(Token::Define),
                _ => Token::Colon,
            },
            '.' => {
                if next == Some('.') && self.second_is(at + 1, '.') {
                    self.bump();
                    self.bump();
                    Token::Ellipsis
                } else {
                    Token::Dot
                }
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semi,
            _ => return Err(self.err(at, SyntaxErrorKind::InvalidCharacter(c))),
        };
        Ok(self.token(at, tok))
    }

    fn two(&mut self, tok: Token) -> Token {
        self.bump();
        tok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(src: &str) -> Vec<Token> {
        let mut lex = Lexer::new(src, 1);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lex.next_token().unwrap();
            if tok == Token::Eof {
                break;
            }
            out.push(tok);
        }
        out
    }

    #[test]
    fn test_idents_and_keywords() {
        let toks = all_tokens("func foo");
        assert_eq!(
            toks,
            vec![Token::Kw(Keyword::Func), Token::Ident("foo".into()), Token::Semi]
        );
    }

    #[test]
    fn test_semicolon_insertion_on_newline() {
        let toks = all_tokens("a\nb\n");
        assert_eq!(
            toks,
            vec![
                Token::Ident("a".into()),
                Token::Semi,
                Token::Ident("b".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_no_semicolon_after_operator() {
        let toks = all_tokens("a +\nb\n");
        assert_eq!(
            toks,
            vec![
                Token::Ident("a".into()),
                Token::Plus,
                Token::Ident("b".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_semicolon_at_eof_without_newline() {
        let toks = all_tokens("return x");
        assert_eq!(
            toks,
            vec![
                Token::Kw(Keyword::Return),
                Token::Ident("x".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let toks = all_tokens("0 42 1.5 .5 5. 1e3 2.5e-2 3i 0x1F 0b101\n");
        let texts: Vec<(LitKind, String)> = toks
            .into_iter()
            .filter_map(|t| match t {
                Token::Literal { kind, text } => Some((kind, text)),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], (LitKind::Int, "0".into()));
        assert_eq!(texts[1], (LitKind::Int, "42".into()));
        assert_eq!(texts[2], (LitKind::Float, "1.5".into()));
        assert_eq!(texts[3], (LitKind::Float, ".5".into()));
        assert_eq!(texts[4], (LitKind::Float, "5.".into()));
        assert_eq!(texts[5], (LitKind::Float, "1e3".into()));
        assert_eq!(texts[6], (LitKind::Float, "2.5e-2".into()));
        assert_eq!(texts[7], (LitKind::Imag, "3i".into()));
        assert_eq!(texts[8], (LitKind::Int, "0x1F".into()));
        assert_eq!(texts[9], (LitKind::Int, "0b101".into()));
    }

    #[test]
    fn test_strings_and_chars() {
        let toks = all_tokens(r#""hi" "a\"b" `raw` 'x' '\n'"#);
        let texts: Vec<String> = toks
            .into_iter()
            .filter_map(|t| match t {
                Token::Literal { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![r#""hi""#, r#""a\"b""#, "`raw`", "'x'", r"'\n'"]);
    }

    #[test]
    fn test_compound_operators() {
        let toks = all_tokens("a &^= b << 2; c <<= 1; ch <- v; x := y");
        assert!(toks.contains(&Token::AmpCaretEq));
        assert!(toks.contains(&Token::Shl));
        assert!(toks.contains(&Token::ShlEq));
        assert!(toks.contains(&Token::Arrow));
        assert!(toks.contains(&Token::Define));
    }

    #[test]
    fn test_comments_skipped() {
        let toks = all_tokens("a // trailing\n/* block */ b\n");
        assert_eq!(
            toks,
            vec![
                Token::Ident("a".into()),
                Token::Semi,
                Token::Ident("b".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_block_comment_with_newline_inserts_semicolon() {
        let toks = all_tokens("a /* spans\nlines */ b\n");
        assert_eq!(
            toks,
            vec![
                Token::Ident("a".into()),
                Token::Semi,
                Token::Ident("b".into()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_ellipsis_vs_dot() {
        let toks = all_tokens("a.b f(xs...)");
        assert!(toks.contains(&Token::Dot));
        assert!(toks.contains(&Token::Ellipsis));
    }

    #[test]
    fn test_unterminated_string_errors() {
        let mut lex = Lexer::new("\"abc", 1);
        let mut last = lex.next_token();
        while let Ok((ref t, _)) = last {
            if *t == Token::Eof {
                panic!("expected an error");
            }
            last = lex.next_token();
        }
        assert!(last.is_err());
    }
}
