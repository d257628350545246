//! Recursive descent parser for the schema definition language.
//!
//! The grammar is a proto-style subset: header statements (`syntax`,
//! `package`, `import`, `option`) followed by `message`, `enum` and
//! `service` blocks. Line comments attach to the next declaration;
//! a comment on a declaration line becomes that node's inline comment.

use thiserror::Error;

use super::ast::{Document, FieldData, Node, NodeId, NodeKind, RpcData};

/// Malformed schema input. Fatal for the current document only.
#[derive(Debug, Error)]
#[error("schema parse error at line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum TokKind {
    Ident(String),
    Str(String),
    Int(i64),
    Punct(char),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Tok {
    kind: TokKind,
    line: usize,
}

fn err(line: usize, message: impl Into<String>) -> ParseError {
    ParseError {
        line,
        message: message.into(),
    }
}

fn lex(src: &str) -> Result<Vec<Tok>, ParseError> {
    let mut toks = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    let mut text = String::new();
                    while let Some(&n) = chars.peek() {
                        if n == '\n' {
                            break;
                        }
                        text.push(n);
                        chars.next();
                    }
                    toks.push(Tok {
                        kind: TokKind::Comment(text),
                        line,
                    });
                } else {
                    return Err(err(line, "expected `//`"));
                }
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                text.push(escaped);
                            }
                        }
                        Some('\n') | None => return Err(err(line, "unterminated string")),
                        Some(other) => text.push(other),
                    }
                }
                toks.push(Tok {
                    kind: TokKind::Str(text),
                    line,
                });
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_digit() {
                        text.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = text
                    .parse::<i64>()
                    .map_err(|_| err(line, format!("invalid integer `{text}`")))?;
                toks.push(Tok {
                    kind: TokKind::Int(value),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut text = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' || n == '.' {
                        text.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok {
                    kind: TokKind::Ident(text),
                    line,
                });
            }
            '{' | '}' | '(' | ')' | '=' | ';' | ',' | '<' | '>' => {
                chars.next();
                toks.push(Tok {
                    kind: TokKind::Punct(c),
                    line,
                });
            }
            other => return Err(err(line, format!("unexpected character `{other}`"))),
        }
    }

    Ok(toks)
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
    last_line: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if let Some(t) = &tok {
            self.last_line = t.line;
            self.pos += 1;
        }
        tok
    }

    fn eof_err(&self) -> ParseError {
        err(self.last_line, "unexpected end of input")
    }

    fn expect_punct(&mut self, want: char) -> Result<usize, ParseError> {
        match self.bump() {
            Some(Tok {
                kind: TokKind::Punct(c),
                line,
            }) if c == want => Ok(line),
            Some(tok) => Err(err(tok.line, format!("expected `{want}`"))),
            None => Err(self.eof_err()),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.bump() {
            Some(Tok {
                kind: TokKind::Ident(name),
                ..
            }) => Ok(name),
            Some(tok) => Err(err(tok.line, "expected identifier")),
            None => Err(self.eof_err()),
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        let line = self.peek().map(|t| t.line).unwrap_or(self.last_line);
        let name = self.expect_ident()?;
        if name == word {
            Ok(())
        } else {
            Err(err(line, format!("expected `{word}`, found `{name}`")))
        }
    }

    fn expect_int(&mut self) -> Result<i64, ParseError> {
        match self.bump() {
            Some(Tok {
                kind: TokKind::Int(value),
                ..
            }) => Ok(value),
            Some(tok) => Err(err(tok.line, "expected integer")),
            None => Err(self.eof_err()),
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.bump() {
            Some(Tok {
                kind: TokKind::Str(text),
                ..
            }) => Ok(text),
            Some(tok) => Err(err(tok.line, "expected string literal")),
            None => Err(self.eof_err()),
        }
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            Some(Tok {
                kind: TokKind::Ident(name),
                ..
            }) => Some(name.as_str()),
            _ => None,
        }
    }

    fn peek_punct(&self, want: char) -> bool {
        matches!(
            self.peek(),
            Some(Tok {
                kind: TokKind::Punct(c),
                ..
            }) if *c == want
        )
    }

    /// Consume consecutive comment tokens at statement position.
    fn take_comments(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(Tok {
            kind: TokKind::Comment(text),
            ..
        }) = self.peek()
        {
            lines.push(text.clone());
            self.bump();
        }
        lines
    }

    /// Consume a trailing comment sharing the declaration's last line.
    fn take_inline(&mut self, decl_line: usize) -> Option<String> {
        match self.peek() {
            Some(Tok {
                kind: TokKind::Comment(text),
                line,
            }) if *line == decl_line => {
                let inline = text.trim().to_string();
                self.bump();
                Some(inline)
            }
            _ => None,
        }
    }
}

/// Parse one schema document.
pub fn parse(src: &str) -> Result<Document, ParseError> {
    let toks = lex(src)?;
    let mut p = Parser {
        toks,
        pos: 0,
        last_line: 1,
    };
    let mut doc = Document::new();

    loop {
        let pending = p.take_comments();
        let Some(tok) = p.peek() else {
            // trailing comments have nothing to attach to
            break;
        };
        let line = tok.line;
        match p.peek_ident() {
            Some("syntax") => {
                doc.head_comments.extend(pending);
                p.bump();
                p.expect_punct('=')?;
                doc.syntax = Some(p.expect_str()?);
                p.expect_punct(';')?;
            }
            Some("package") => {
                doc.head_comments.extend(pending);
                p.bump();
                doc.package = Some(p.expect_ident()?);
                p.expect_punct(';')?;
            }
            Some("import") => {
                doc.head_comments.extend(pending);
                p.bump();
                doc.imports.push(p.expect_str()?);
                p.expect_punct(';')?;
            }
            Some("option") => {
                doc.head_comments.extend(pending);
                p.bump();
                let name = p.expect_ident()?;
                p.expect_punct('=')?;
                let value = p.expect_str()?;
                p.expect_punct(';')?;
                doc.options.push((name, value));
            }
            Some("message") => {
                let id = parse_message(&mut p, &mut doc)?;
                doc.node_mut(id).comment = pending;
                doc.add_root(id);
            }
            Some("enum") => {
                let id = parse_enum(&mut p, &mut doc)?;
                doc.node_mut(id).comment = pending;
                doc.add_root(id);
            }
            Some("service") => {
                let id = parse_service(&mut p, &mut doc)?;
                doc.node_mut(id).comment = pending;
                doc.add_root(id);
            }
            _ => return Err(err(line, "expected top-level declaration")),
        }
    }

    Ok(doc)
}

fn parse_message(p: &mut Parser, doc: &mut Document) -> Result<NodeId, ParseError> {
    p.expect_keyword("message")?;
    let name = p.expect_ident()?;
    p.expect_punct('{')?;
    let id = doc.alloc(Node::new(name, NodeKind::Message));

    loop {
        let pending = p.take_comments();
        if p.peek().is_none() {
            return Err(p.eof_err());
        }
        if p.peek_punct('}') {
            p.bump();
            break;
        }
        match p.peek_ident() {
            Some("message") => {
                let child = parse_message(p, doc)?;
                doc.node_mut(child).comment = pending;
                doc.add_child(id, child);
            }
            Some("enum") => {
                let child = parse_enum(p, doc)?;
                doc.node_mut(child).comment = pending;
                doc.add_child(id, child);
            }
            Some(_) => {
                let child = parse_field(p, doc)?;
                doc.node_mut(child).comment = pending;
                doc.add_child(id, child);
            }
            None => {
                let line = p.peek().map(|t| t.line).unwrap_or(p.last_line);
                return Err(err(line, "expected field or nested declaration"));
            }
        }
    }

    Ok(id)
}

fn parse_field(p: &mut Parser, doc: &mut Document) -> Result<NodeId, ParseError> {
    let mut repeated = false;
    let mut optional = false;
    loop {
        match p.peek_ident() {
            Some("repeated") => {
                repeated = true;
                p.bump();
            }
            Some("optional") => {
                optional = true;
                p.bump();
            }
            _ => break,
        }
    }

    let type_name = if p.peek_ident() == Some("map") {
        p.bump();
        p.expect_punct('<')?;
        let key = p.expect_ident()?;
        p.expect_punct(',')?;
        let value = p.expect_ident()?;
        p.expect_punct('>')?;
        format!("map<{key}, {value}>")
    } else {
        p.expect_ident()?
    };

    let name = p.expect_ident()?;
    p.expect_punct('=')?;
    let number = p.expect_int()?;
    let end_line = p.expect_punct(';')?;

    let mut node = Node::new(
        name,
        NodeKind::Field(FieldData {
            type_name,
            number,
            repeated,
            optional,
        }),
    );
    node.inline_comment = p.take_inline(end_line);
    Ok(doc.alloc(node))
}

fn parse_enum(p: &mut Parser, doc: &mut Document) -> Result<NodeId, ParseError> {
    p.expect_keyword("enum")?;
    let name = p.expect_ident()?;
    p.expect_punct('{')?;
    let id = doc.alloc(Node::new(name, NodeKind::Enum));

    loop {
        let pending = p.take_comments();
        if p.peek().is_none() {
            return Err(p.eof_err());
        }
        if p.peek_punct('}') {
            p.bump();
            break;
        }
        let value_name = p.expect_ident()?;
        p.expect_punct('=')?;
        let number = p.expect_int()?;
        let end_line = p.expect_punct(';')?;

        let mut node = Node::new(value_name, NodeKind::EnumValue(number));
        node.comment = pending;
        node.inline_comment = p.take_inline(end_line);
        let child = doc.alloc(node);
        doc.add_child(id, child);
    }

    Ok(id)
}

fn parse_service(p: &mut Parser, doc: &mut Document) -> Result<NodeId, ParseError> {
    p.expect_keyword("service")?;
    let name = p.expect_ident()?;
    p.expect_punct('{')?;
    let id = doc.alloc(Node::new(name, NodeKind::Service));

    loop {
        let pending = p.take_comments();
        if p.peek().is_none() {
            return Err(p.eof_err());
        }
        if p.peek_punct('}') {
            p.bump();
            break;
        }
        p.expect_keyword("rpc")?;
        let rpc_name = p.expect_ident()?;
        p.expect_punct('(')?;
        let request = p.expect_ident()?;
        p.expect_punct(')')?;
        p.expect_keyword("returns")?;
        p.expect_punct('(')?;
        let response = p.expect_ident()?;
        p.expect_punct(')')?;
        let end_line = if p.peek_punct('{') {
            p.bump();
            p.expect_punct('}')?
        } else {
            p.expect_punct(';')?
        };

        let mut node = Node::new(rpc_name, NodeKind::Rpc(RpcData { request, response }));
        node.comment = pending;
        node.inline_comment = p.take_inline(end_line);
        let child = doc.alloc(node);
        doc.add_child(id, child);
    }

    Ok(id)
}
