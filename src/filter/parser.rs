//! Recursive-descent parser for a filter body's tokens, implementing the
//! precedence grammar (lowest to highest): `||`, `&&`, unary `!`,
//! comparison, primary.

use crate::filter::ast::{CmpOp, Expr, Origin};
use crate::filter::value::Value;
use crate::lexer::{LexKind, Lexeme};
use crate::path;
use crate::Error;

pub(crate) fn parse(tokens: &[Lexeme]) -> Result<Expr, Error> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if let Some(trailing) = parser.peek() {
        return Err(Error::new(
            "unexpected trailing token in filter",
            trailing.text.clone(),
            trailing.offset,
        ));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [Lexeme],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Lexeme> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Lexeme> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eof_error(&self, message: &str) -> Error {
        let offset = self.tokens.last().map(|t| t.offset + t.text.len()).unwrap_or(0);
        Error::new(message.to_string(), "", offset)
    }

    fn parse_or(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek().map(|t| &t.kind), Some(LexKind::OrOr)) {
            self.bump();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, Error> {
        let mut lhs = self.parse_unary()?;
        while matches!(self.peek().map(|t| &t.kind), Some(LexKind::AndAnd)) {
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, Error> {
        if matches!(self.peek().map(|t| &t.kind), Some(LexKind::Bang)) {
            self.bump();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, Error> {
        let lhs = self.parse_primary()?;
        let op = match self.peek().map(|t| &t.kind) {
            Some(LexKind::EqEq) => CmpOp::Eq,
            Some(LexKind::Ne) => CmpOp::Ne,
            Some(LexKind::Lt) => CmpOp::Lt,
            Some(LexKind::Le) => CmpOp::Le,
            Some(LexKind::Gt) => CmpOp::Gt,
            Some(LexKind::Ge) => CmpOp::Ge,
            Some(LexKind::RegexMatch) => CmpOp::RegexMatch,
            _ => return Ok(wrap_bare(lhs)),
        };
        self.bump();
        let rhs = self.parse_primary()?;
        Ok(Expr::BinaryOp(Box::new(lhs), op, Box::new(rhs)))
    }

    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let tok = self
            .bump()
            .ok_or_else(|| self.eof_error("unexpected end of filter"))?;
        match &tok.kind {
            LexKind::LParen => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(t) if t.kind == LexKind::RParen => Ok(inner),
                    _ => Err(Error::new(
                        "expected ')' to close group",
                        tok.text.clone(),
                        tok.offset,
                    )),
                }
            }
            LexKind::Bang => {
                let inner = self.parse_unary()?;
                Ok(Expr::Not(Box::new(inner)))
            }
            LexKind::Int => tok
                .text
                .parse::<i64>()
                .map(|i| Expr::Literal(Value::Int(i)))
                .map_err(|_| invalid_literal(tok)),
            LexKind::Float => tok
                .text
                .parse::<f64>()
                .map(|f| Expr::Literal(Value::Float(f)))
                .map_err(|_| invalid_literal(tok)),
            LexKind::Bool(b) => Ok(Expr::Literal(Value::Bool(*b))),
            LexKind::Null => Ok(Expr::Literal(Value::Null)),
            LexKind::Str => Ok(Expr::Literal(Value::Str(unquote(&tok.text)))),
            LexKind::Regex => {
                let pattern = &tok.text[1..tok.text.len() - 1];
                // Already validated during lexing; re-compiling here keeps
                // the AST node self-contained.
                let re = regex::Regex::new(pattern)
                    .map_err(|e| Error::new(format!("invalid regex: {e}"), tok.text.clone(), tok.offset))?;
                Ok(Expr::Regex(re))
            }
            LexKind::PathAt => compile_query(Origin::At, tok),
            LexKind::PathRoot => compile_query(Origin::Root, tok),
            _ => Err(Error::new(
                "expected a literal, '@'/'$' path, or '(' in filter",
                tok.text.clone(),
                tok.offset,
            )),
        }
    }
}

/// A bare `@...`/`$...` path-query with no comparison operator following
/// it is an existence test; anything else stands alone unchanged.
fn wrap_bare(expr: Expr) -> Expr {
    match expr {
        Expr::PathQuery(..) => Expr::Exists(Box::new(expr)),
        other => other,
    }
}

fn compile_query(origin: Origin, tok: &Lexeme) -> Result<Expr, Error> {
    let sub_path = path::compile_fragment(&tok.text)?;
    Ok(Expr::PathQuery(origin, Box::new(sub_path)))
}

fn invalid_literal(tok: &Lexeme) -> Error {
    Error::new("invalid numeric literal", tok.text.clone(), tok.offset)
}

/// Strips the surrounding `'...'` quotes and resolves `\'`/`\\` escapes.
fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn tokenize_filter(body: &str) -> Vec<Lexeme> {
        let wrapped = format!("[?({body})]");
        let mut lexer = Lexer::new(&wrapped);
        lexer.next_lexeme(); // FilterBegin
        let mut out = Vec::new();
        loop {
            let lex = lexer.next_lexeme();
            if matches!(lex.kind, LexKind::FilterEnd | LexKind::Eof) {
                break;
            }
            out.push(lex);
        }
        out
    }

    #[test]
    fn parses_simple_equality() {
        let tokens = tokenize_filter("@.name=='nginx'");
        let expr = parse(&tokens).unwrap();
        assert!(matches!(expr, Expr::BinaryOp(_, CmpOp::Eq, _)));
    }

    #[test]
    fn parses_bare_query_as_exists() {
        let tokens = tokenize_filter("@.enabled");
        let expr = parse(&tokens).unwrap();
        assert!(matches!(expr, Expr::Exists(_)));
    }

    #[test]
    fn parses_and_or_precedence() {
        let tokens = tokenize_filter("@.a==1 && @.b==2 || @.c==3");
        let expr = parse(&tokens).unwrap();
        assert!(matches!(expr, Expr::Or(_, _)));
    }

    #[test]
    fn parses_negated_group() {
        let tokens = tokenize_filter("!(@.a==1)");
        let expr = parse(&tokens).unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }
}
