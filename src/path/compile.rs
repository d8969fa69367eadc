//! Drives the [`Lexer`] to build a compiled step chain from a path string.

use crate::filter::ast::Expr;
use crate::lexer::{LexKind, Lexeme, Lexer};
use crate::path::PathOptions;
use crate::slice::{self, split_top_level_commas, Subscript};
use crate::Error;

/// One compiled step in a path: a function of `(node, root) -> nodes`,
/// applied left to right by [`super::eval`].
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Yields the input node unchanged. Used for an empty path/sub-path.
    Identity,
    /// Yields the document root. Only ever the first step.
    Root,
    Child {
        name: ChildName,
        as_property: bool,
    },
    Subscript {
        spec: Subscript,
        as_property: bool,
        /// Whether the raw subscript text was exactly `*`. A wildcard
        /// subscript has no singular property name, so `[*]~` always
        /// yields nothing even though `[0]~` yields the index as a name.
        is_wildcard: bool,
    },
    /// `..`: gathers the input node plus every descendant, then applies
    /// the wrapped step to each, flattening the results.
    Recurse(Box<Step>),
    Filter(Box<Expr>),
}

#[derive(Debug, Clone)]
pub(crate) enum ChildName {
    Named(String),
    BracketList(Vec<String>),
    Wildcard,
}

impl Step {
    pub(crate) fn is_property_name(&self) -> bool {
        matches!(
            self,
            Step::Child {
                as_property: true,
                ..
            } | Step::Subscript {
                as_property: true,
                ..
            }
        )
    }
}

pub(crate) fn compile(text: &str, options: &PathOptions) -> Result<Vec<Step>, Error> {
    let mut lexer = Lexer::new(text);
    let mut steps = Vec::new();

    let first = lexer.next_lexeme();
    match &first.kind {
        LexKind::Eof => return Ok(vec![Step::Identity]),
        LexKind::Root => steps.push(Step::Root),
        LexKind::UndottedChild => steps.push(child_step(&first, false)),
        LexKind::PropertyName => steps.push(child_step(&first, true)),
        LexKind::Error(msg) => return Err(Error::new(msg.clone(), first.text, first.offset)),
        // Any other lexeme (`DotChild`, `BracketChild`, `ArraySubscript`,
        // `RecursiveDescent`, `FilterBegin`, ...) is a legal first step too —
        // the grammar's leading `$` is optional, and a filter's `@`/`$`
        // path-tail is compiled through here with its leading `.`/`[`
        // still attached. Only a genuinely unrecognized lexeme is an error,
        // which `step_from_lexeme` itself reports.
        _ => steps.push(step_from_lexeme(&mut lexer, first)?),
    }
    check_step_limit(&steps, options, text)?;

    loop {
        let lex = lexer.next_lexeme();
        if matches!(lex.kind, LexKind::Eof) {
            break;
        }
        if let LexKind::Error(msg) = &lex.kind {
            return Err(Error::new(msg.clone(), lex.text.clone(), lex.offset));
        }
        steps.push(step_from_lexeme(&mut lexer, lex)?);
        check_step_limit(&steps, options, text)?;
    }

    if let Some(pos) = steps.iter().position(Step::is_property_name) {
        if pos != steps.len() - 1 {
            return Err(Error::new(
                "'~' is only legal as the final step of a path",
                text,
                0,
            ));
        }
    }

    Ok(steps)
}

/// Compiles one already-scanned lexeme into its `Step`, pulling more
/// lexemes from `lexer` for the multi-token `FilterBegin`/
/// `RecursiveFilterBegin` forms. Shared between the first-step and
/// subsequent-step dispatch, since both accept the same set of step kinds.
fn step_from_lexeme(lexer: &mut Lexer, lex: Lexeme) -> Result<Step, Error> {
    match &lex.kind {
        LexKind::DotChild => Ok(child_step(&lex, false)),
        LexKind::PropertyName => Ok(child_step(&lex, true)),
        LexKind::BracketChild => bracket_step(&lex, false),
        LexKind::BracketPropertyName => bracket_step(&lex, true),
        LexKind::ArraySubscript => subscript_step(&lex, false),
        LexKind::ArraySubscriptProperty => subscript_step(&lex, true),
        LexKind::RecursiveDescent => Ok(Step::Recurse(Box::new(Step::Identity))),
        LexKind::FilterBegin => {
            let expr = compile_filter_body(lexer)?;
            Ok(Step::Filter(Box::new(expr)))
        }
        LexKind::RecursiveFilterBegin => {
            let expr = compile_filter_body(lexer)?;
            Ok(Step::Recurse(Box::new(Step::Filter(Box::new(expr)))))
        }
        other => {
            let message = format!("unexpected token {other:?} in path");
            Err(Error::new(message, lex.text.clone(), lex.offset))
        }
    }
}

fn check_step_limit(steps: &[Step], options: &PathOptions, text: &str) -> Result<(), Error> {
    if let Some(max) = options.max_steps {
        if steps.len() > max {
            return Err(Error::new(
                format!("path exceeds the configured limit of {max} steps"),
                text,
                0,
            ));
        }
    }
    Ok(())
}

fn compile_filter_body(lexer: &mut Lexer) -> Result<Expr, Error> {
    let mut tokens: Vec<Lexeme> = Vec::new();
    loop {
        let lex = lexer.next_lexeme();
        match &lex.kind {
            LexKind::FilterEnd => break,
            LexKind::Eof => {
                return Err(Error::new("unterminated filter", "", lex.offset));
            }
            LexKind::Error(msg) => return Err(Error::new(msg.clone(), lex.text, lex.offset)),
            _ => tokens.push(lex),
        }
    }
    crate::filter::parser::parse(&tokens)
}

/// Strips a leading `.` (if any) and a trailing `~` (if any) from a
/// `DotChild`/`UndottedChild`/`PropertyName` lexeme's text to recover the
/// bare identifier.
fn bare_name(text: &str) -> &str {
    let text = text.strip_prefix('.').unwrap_or(text);
    text.strip_suffix('~').unwrap_or(text)
}

fn child_step(lex: &Lexeme, as_property: bool) -> Step {
    let name = bare_name(&lex.text);
    let name = if name == "*" {
        ChildName::Wildcard
    } else {
        ChildName::Named(name.to_string())
    };
    Step::Child { name, as_property }
}

fn bracket_step(lex: &Lexeme, as_property: bool) -> Result<Step, Error> {
    let text = lex.text.strip_suffix('~').unwrap_or(&lex.text);
    let inner = &text[1..text.len() - 1];
    let names = split_top_level_commas(inner)
        .into_iter()
        .map(|member| unquote_name(member.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| Error::new("malformed quoted name in bracket child", lex.text.clone(), lex.offset))?;
    Ok(Step::Child {
        name: ChildName::BracketList(names),
        as_property,
    })
}

fn subscript_step(lex: &Lexeme, as_property: bool) -> Result<Step, Error> {
    let text = lex.text.strip_suffix('~').unwrap_or(&lex.text);
    let inner = &text[1..text.len() - 1];
    let is_wildcard = inner.trim() == "*";
    let spec = slice::compile(inner, lex.offset)?;
    Ok(Step::Subscript {
        spec,
        as_property,
        is_wildcard,
    })
}

fn unquote_name(s: &str) -> Result<String, ()> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || !(bytes[0] == b'\'' || bytes[0] == b'"') || bytes[bytes.len() - 1] != bytes[0] {
        return Err(());
    }
    let inner = &s[1..s.len() - 1];
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
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_default(text: &str) -> Result<Vec<Step>, Error> {
        compile(text, &PathOptions::default())
    }

    #[test]
    fn empty_path_is_identity() {
        let steps = compile_default("").unwrap();
        assert!(matches!(steps.as_slice(), [Step::Identity]));
    }

    #[test]
    fn root_then_dot_children() {
        let steps = compile_default("$.spec.containers").unwrap();
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[0], Step::Root));
    }

    #[test]
    fn tilde_not_at_end_is_an_error() {
        assert!(compile_default("$.a~.b").is_err());
    }

    #[test]
    fn unterminated_bracket_is_an_error() {
        assert!(compile_default("$.[").is_err());
    }

    #[test]
    fn bracket_child_names_are_unquoted() {
        let steps = compile_default("$['a','b']").unwrap();
        match &steps[1] {
            Step::Child {
                name: ChildName::BracketList(names),
                ..
            } => assert_eq!(names, &vec!["a".to_string(), "b".to_string()]),
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn step_limit_is_enforced() {
        let opts = PathOptions::new().max_steps(2);
        let err = compile("$.a.b.c", &opts).unwrap_err();
        assert!(err.message().contains("limit"));
    }

    #[test]
    fn leading_dot_is_a_legal_first_step() {
        // This is the shape a filter's `@`/`$` path-tail arrives in: the
        // sigil is already stripped but the leading `.` is not.
        let steps = compile_default(".name").unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(
            steps[0],
            Step::Child {
                as_property: false,
                ..
            }
        ));
    }

    #[test]
    fn leading_bracket_is_a_legal_first_step() {
        let steps = compile_default("[0]").unwrap();
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0], Step::Subscript { .. }));
    }
}
