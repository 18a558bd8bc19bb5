//! Signature parser.
//!
//! Grammar:
//!
//! ```text
//! type    := primary ("[]")*
//! primary := "?" ("extends" type)?
//!          | NAME ("<" type ("," type)* ">")?
//! header  := NAME ("<" params ">")?
//! params  := param ("," param)*
//! param   := NAME ("extends" type ("&" type)*)?
//! ```
//!
//! Parsing produces unresolved `SigNode` trees; names are bound to
//! declarations and type variables by the loader builder.

use crate::error::HostError;
use typeinfo_common::limits::MAX_SIGNATURE_NESTING;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SigNode {
    Named {
        name: String,
        arguments: Vec<SigNode>,
    },
    Array(Box<SigNode>),
    Wildcard(Option<Box<SigNode>>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParamNode {
    pub(crate) name: String,
    pub(crate) bounds: Vec<SigNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) name: String,
    pub(crate) params: Vec<ParamNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Extends,
    Lt,
    Gt,
    Comma,
    Question,
    Amp,
    ArraySuffix,
    End,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn syntax_error(signature: &str, offset: usize, message: impl Into<String>) -> HostError {
    HostError::Syntax {
        signature: signature.to_string(),
        offset,
        message: message.into(),
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, HostError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        let token = match ch {
            c if c.is_whitespace() => continue,
            '<' => Token::Lt,
            '>' => Token::Gt,
            ',' => Token::Comma,
            '?' => Token::Question,
            '&' => Token::Amp,
            '[' => match chars.next() {
                Some((_, ']')) => Token::ArraySuffix,
                _ => return Err(syntax_error(src, offset, "expected `]` after `[`")),
            },
            c if is_ident_start(c) => {
                let mut end = offset + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_ident_part(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                match &src[offset..end] {
                    "extends" => Token::Extends,
                    text => Token::Ident(text.to_string()),
                }
            }
            other => {
                return Err(syntax_error(
                    src,
                    offset,
                    format!("unexpected character `{other}`"),
                ));
            }
        };
        tokens.push((token, offset));
    }

    tokens.push((Token::End, src.len()));
    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: u32,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Self, HostError> {
        Ok(Self {
            src,
            tokens: tokenize(src)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &Token {
        // `tokenize` always terminates the stream with `End`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> HostError {
        syntax_error(self.src, self.offset(), message)
    }

    fn ident(&mut self, what: &str) -> Result<String, HostError> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), HostError> {
        if *self.peek() == token {
            self.bump();
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn finish(&self) -> Result<(), HostError> {
        match self.peek() {
            Token::End => Ok(()),
            _ => Err(self.error("unexpected trailing input")),
        }
    }

    fn enter(&mut self) -> Result<(), HostError> {
        self.depth += 1;
        if self.depth > MAX_SIGNATURE_NESTING {
            return Err(HostError::NestingTooDeep {
                signature: self.src.to_string(),
                limit: MAX_SIGNATURE_NESTING,
            });
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<SigNode, HostError> {
        self.enter()?;

        let mut node = match self.peek() {
            Token::Question => {
                self.bump();
                let upper = if *self.peek() == Token::Extends {
                    self.bump();
                    Some(Box::new(self.parse_type()?))
                } else {
                    None
                };
                SigNode::Wildcard(upper)
            }
            Token::Ident(_) => {
                let name = self.ident("a type name")?;
                let arguments = if *self.peek() == Token::Lt {
                    self.parse_arguments()?
                } else {
                    Vec::new()
                };
                SigNode::Named { name, arguments }
            }
            _ => return Err(self.error("expected a type")),
        };

        while *self.peek() == Token::ArraySuffix {
            self.bump();
            node = SigNode::Array(Box::new(node));
        }

        self.depth -= 1;
        Ok(node)
    }

    fn parse_arguments(&mut self) -> Result<Vec<SigNode>, HostError> {
        self.expect(Token::Lt, "`<`")?;
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type()?);
            match self.bump() {
                Token::Comma => continue,
                Token::Gt => break,
                _ => return Err(self.error("expected `,` or `>` in type arguments")),
            }
        }
        Ok(arguments)
    }

    fn parse_params(&mut self) -> Result<Vec<ParamNode>, HostError> {
        let mut params = Vec::new();
        loop {
            let name = self.ident("a type parameter name")?;
            let mut bounds = Vec::new();
            if *self.peek() == Token::Extends {
                self.bump();
                bounds.push(self.parse_type()?);
                while *self.peek() == Token::Amp {
                    self.bump();
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(ParamNode { name, bounds });
            if *self.peek() != Token::Comma {
                break;
            }
            self.bump();
        }
        Ok(params)
    }
}

/// Parse a type use such as `Map<String, List<Person>>` or `Person[]`.
pub(crate) fn parse_type(src: &str) -> Result<SigNode, HostError> {
    let mut parser = Parser::new(src)?;
    let node = parser.parse_type()?;
    parser.finish()?;
    Ok(node)
}

/// Parse a declaration header such as `Repository<T, ID>`.
pub(crate) fn parse_header(src: &str) -> Result<Header, HostError> {
    let mut parser = Parser::new(src)?;
    let name = parser.ident("a declaration name")?;
    let params = if *parser.peek() == Token::Lt {
        parser.bump();
        let params = parser.parse_params()?;
        parser.expect(Token::Gt, "`>` closing the type parameters")?;
        params
    } else {
        Vec::new()
    };
    parser.finish()?;
    Ok(Header { name, params })
}

/// Parse a method's type parameter list, with or without the angle brackets:
/// `S extends T` and `<S extends T>` are equivalent.
pub(crate) fn parse_type_params(src: &str) -> Result<Vec<ParamNode>, HostError> {
    let mut parser = Parser::new(src)?;
    let bracketed = *parser.peek() == Token::Lt;
    if bracketed {
        parser.bump();
    }
    let params = parser.parse_params()?;
    if bracketed {
        parser.expect(Token::Gt, "`>` closing the type parameters")?;
    }
    parser.finish()?;
    Ok(params)
}

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod tests;
