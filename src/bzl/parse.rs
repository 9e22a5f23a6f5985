//! Parser for the BUILD subset
//!
//! Hand-rolled lexer plus recursive descent. Newlines are insignificant
//! (every top-level statement is a call, which self-terminates at its
//! closing parenthesis); comment attachment is decided by line numbers: a
//! comment on the same line as the token before it becomes a suffix comment,
//! anything else becomes a before comment of the next node.

use std::path::{Path, PathBuf};

use crate::bzl::ast::{BuildFile, Expr, ExprKind};
use crate::error::{SpringbokError, SpringbokResult};

/// Parse the BUILD file at `path`
pub fn parse_file(path: &Path) -> SpringbokResult<BuildFile> {
    let text = std::fs::read_to_string(path)?;
    parse_text(path, &text)
}

/// Parse BUILD file content; `path` is used for error reporting only
pub fn parse_text(path: &Path, text: &str) -> SpringbokResult<BuildFile> {
    let tokens = lex(path, text)?;
    let mut parser = Parser {
        path: path.to_path_buf(),
        tokens,
        pos: 0,
        last_line: 0,
    };
    parser.parse_build_file()
}

#[derive(Debug, Clone, PartialEq)]
enum TokKind {
    Ident(String),
    Str(String),
    Comment(String),
    Punct(char),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokKind,
    line: usize,
}

fn lex(path: &Path, text: &str) -> SpringbokResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                chars.next();
                let mut comment = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    comment.push(c);
                    chars.next();
                }
                tokens.push(Token {
                    kind: TokKind::Comment(comment.trim().to_string()),
                    line,
                });
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(c) => value.push(c),
                            None => {
                                return Err(parse_err(path, line, "unterminated string literal"))
                            }
                        },
                        Some(c) if c == quote => break,
                        Some('\n') | None => {
                            return Err(parse_err(path, line, "unterminated string literal"))
                        }
                        Some(c) => value.push(c),
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Str(value),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokKind::Ident(name),
                    line,
                });
            }
            '(' | ')' | '[' | ']' | '{' | '}' | ',' | ':' | '=' | '+' => {
                chars.next();
                tokens.push(Token {
                    kind: TokKind::Punct(c),
                    line,
                });
            }
            c => {
                return Err(parse_err(
                    path,
                    line,
                    format!("unexpected character {c:?}"),
                ));
            }
        }
    }
    tokens.push(Token {
        kind: TokKind::Eof,
        line,
    });
    Ok(tokens)
}

fn parse_err(path: &Path, line: usize, message: impl Into<String>) -> SpringbokError {
    SpringbokError::Parse {
        file: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

struct Parser {
    path: PathBuf,
    tokens: Vec<Token>,
    pos: usize,
    // line of the most recently consumed token, for suffix-comment attachment
    last_line: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &TokKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn next(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        self.last_line = tok.line;
        tok
    }

    fn expect_punct(&mut self, c: char) -> SpringbokResult<()> {
        let tok = self.next();
        if tok.kind == TokKind::Punct(c) {
            Ok(())
        } else {
            Err(parse_err(
                &self.path,
                tok.line,
                format!("expected {c:?}, found {:?}", tok.kind),
            ))
        }
    }

    /// Consume consecutive comment tokens; these belong to whatever follows.
    fn collect_before(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokKind::Comment(text) => {
                    comments.push(text);
                    self.next();
                }
                _ => break,
            }
        }
        comments
    }

    /// Consume comments on the same line as the node that just ended.
    fn take_suffix(&mut self) -> Vec<String> {
        let line = self.last_line;
        let mut comments = Vec::new();
        loop {
            let tok = self.peek().clone();
            match tok.kind {
                TokKind::Comment(text) if tok.line == line => {
                    comments.push(text);
                    self.next();
                }
                _ => break,
            }
        }
        comments
    }

    fn parse_build_file(&mut self) -> SpringbokResult<BuildFile> {
        let mut file = BuildFile::new(&self.path);
        loop {
            let before = self.collect_before();
            if self.peek().kind == TokKind::Eof {
                // Trailing comments with no following statement stay with the
                // last statement so sentinel markers remain visible.
                if let Some(last) = file.stmts.last_mut() {
                    last.comments.after.extend(before);
                }
                break;
            }
            let mut stmt = self.parse_expr()?;
            let mut all_before = before;
            all_before.append(&mut stmt.comments.before);
            stmt.comments.before = all_before;
            stmt.comments.suffix.extend(self.take_suffix());
            file.stmts.push(stmt);
        }
        Ok(file)
    }

    fn parse_expr(&mut self) -> SpringbokResult<Expr> {
        let mut lhs = self.parse_primary()?;
        while self.peek().kind == TokKind::Punct('+') {
            self.next();
            let rhs = self.parse_primary()?;
            lhs = Expr::binary("+", lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> SpringbokResult<Expr> {
        let tok = self.next();
        match tok.kind {
            TokKind::Str(value) => Ok(Expr::string(value)),
            TokKind::Ident(name) => {
                if self.peek().kind == TokKind::Punct('(') {
                    self.next();
                    let args = self.parse_call_args()?;
                    Ok(Expr::call(Expr::ident(name), args))
                } else {
                    Ok(Expr::ident(name))
                }
            }
            TokKind::Punct('[') => self.parse_list(),
            TokKind::Punct('{') => self.parse_dict(),
            other => Err(parse_err(
                &self.path,
                tok.line,
                format!("expected expression, found {other:?}"),
            )),
        }
    }

    /// Arguments of a call, after the opening parenthesis. `ident = expr`
    /// becomes a `KeyValue`; everything else is positional.
    fn parse_call_args(&mut self) -> SpringbokResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            let before = self.collect_before();
            if self.peek().kind == TokKind::Punct(')') {
                self.next();
                self.attach_dangling(&mut args, before);
                break;
            }
            let mut arg = if matches!(self.peek().kind, TokKind::Ident(_))
                && *self.peek_at(1) == TokKind::Punct('=')
            {
                let key = match self.next().kind {
                    TokKind::Ident(name) => Expr::ident(name),
                    _ => unreachable!(),
                };
                self.next(); // '='
                let value = self.parse_expr()?;
                Expr::key_value(key, value)
            } else {
                self.parse_expr()?
            };
            if self.peek().kind == TokKind::Punct(',') {
                self.next();
            }
            arg.comments.before = before;
            arg.comments.suffix.extend(self.take_suffix());
            args.push(arg);
        }
        Ok(args)
    }

    fn parse_list(&mut self) -> SpringbokResult<Expr> {
        let open_line = self.last_line;
        let mut items = Vec::new();
        loop {
            let before = self.collect_before();
            if self.peek().kind == TokKind::Punct(']') {
                let close_line = self.next().line;
                self.attach_dangling(&mut items, before);
                // Remember whether the source spelled this list across
                // multiple lines so printing it back is layout-stable.
                let mut list = Expr::list(items);
                if let ExprKind::List {
                    force_multiline, ..
                } = &mut list.kind
                {
                    *force_multiline = close_line != open_line;
                }
                return Ok(list);
            }
            let mut item = self.parse_expr()?;
            if self.peek().kind == TokKind::Punct(',') {
                self.next();
            }
            item.comments.before = before;
            item.comments.suffix.extend(self.take_suffix());
            items.push(item);
        }
    }

    fn parse_dict(&mut self) -> SpringbokResult<Expr> {
        let mut entries = Vec::new();
        loop {
            let before = self.collect_before();
            if self.peek().kind == TokKind::Punct('}') {
                self.next();
                self.attach_dangling(&mut entries, before);
                break;
            }
            let key = self.parse_expr()?;
            self.expect_punct(':')?;
            let value = self.parse_expr()?;
            let mut entry = Expr::key_value(key, value);
            if self.peek().kind == TokKind::Punct(',') {
                self.next();
            }
            entry.comments.before = before;
            entry.comments.suffix.extend(self.take_suffix());
            entries.push(entry);
        }
        Ok(Expr::dict(entries))
    }

    /// Comments between the last element and a closing bracket have no
    /// following node; keep them with the preceding element.
    fn attach_dangling(&self, elements: &mut [Expr], comments: Vec<String>) {
        if comments.is_empty() {
            return;
        }
        if let Some(last) = elements.last_mut() {
            last.comments.after.extend(comments);
        }
    }
}
