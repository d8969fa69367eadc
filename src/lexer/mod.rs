//! Hand-written scanner for the path grammar.
//!
//! [`Lexer`] is a stateful cursor over the path string: it tracks the
//! current byte offset, whether it has emitted anything yet (to decide
//! whether a bare identifier is a legal [`LexKind::UndottedChild`]), and —
//! while inside a `[?( ... )]` filter — a small amount of nesting state so
//! it knows when the filter's closing `)]` has been reached. `next_lexeme`
//! always returns one lexeme; once it returns `Error`, every subsequent
//! call returns `Eof`, per the grammar's "caller must stop" contract.

/// One scanned unit of the path grammar: a kind, the exact source text it
/// covers, and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub kind: LexKind,
    pub text: String,
    pub offset: usize,
}

/// The kinds of lexemes this scanner produces, per the path grammar: path
/// step kinds, filter tokens, literals, `Error`, and `Eof`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LexKind {
    Error(String),
    Eof,
    /// Synthesized by the compiler for an empty path or sub-path, never
    /// produced directly by the scanner.
    Identity,
    Root,
    DotChild,
    UndottedChild,
    BracketChild,
    ArraySubscript,
    RecursiveDescent,
    FilterBegin,
    RecursiveFilterBegin,
    FilterEnd,
    PropertyName,
    BracketPropertyName,
    ArraySubscriptProperty,

    // Filter-internal tokens.
    Int,
    Float,
    Str,
    Bool(bool),
    Null,
    Regex,
    PathAt,
    PathRoot,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    RegexMatch,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Path,
    Filter,
}

pub(crate) struct Lexer<'a> {
    remaining: &'a str,
    offset: usize,
    at_start: bool,
    mode: Mode,
    /// Depth of `(` grouping inside the current filter; 0 when in `Path`
    /// mode. Reaching 0 on a `)` closes the filter.
    paren_depth: usize,
    latched_error: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Lexer {
            remaining: input,
            offset: 0,
            at_start: true,
            mode: Mode::Path,
            paren_depth: 0,
            latched_error: false,
            finished: false,
        }
    }

    fn advance_by(&mut self, len: usize) {
        self.remaining = &self.remaining[len..];
        self.offset += len;
    }

    fn make(&mut self, kind: LexKind, len: usize) -> Lexeme {
        let start = self.offset;
        let text = self.remaining[..len].to_string();
        self.advance_by(len);
        Lexeme {
            kind,
            text,
            offset: start,
        }
    }

    fn error(&mut self, message: impl Into<String>, len: usize) -> Lexeme {
        let start = self.offset;
        let len = len.min(self.remaining.len());
        let text = self.remaining[..len].to_string();
        self.advance_by(len);
        self.latched_error = true;
        Lexeme {
            kind: LexKind::Error(message.into()),
            text,
            offset: start,
        }
    }

    pub(crate) fn next_lexeme(&mut self) -> Lexeme {
        if self.finished {
            return Lexeme {
                kind: LexKind::Eof,
                text: String::new(),
                offset: self.offset,
            };
        }
        if self.latched_error {
            self.finished = true;
            return Lexeme {
                kind: LexKind::Eof,
                text: String::new(),
                offset: self.offset,
            };
        }

        let lexeme = match self.mode {
            Mode::Path => self.next_path_lexeme(),
            Mode::Filter => self.next_filter_lexeme(),
        };

        if matches!(lexeme.kind, LexKind::Eof) {
            self.finished = true;
        }
        self.at_start = false;
        lexeme
    }

    // ---- path mode ------------------------------------------------------

    fn next_path_lexeme(&mut self) -> Lexeme {
        if self.remaining.is_empty() {
            return self.make(LexKind::Eof, 0);
        }

        let c = self.remaining.chars().next().unwrap();
        match c {
            '$' if self.at_start => self.make(LexKind::Root, 1),
            '.' => self.lex_dot(),
            '[' => self.lex_open_bracket(),
            '~' => self.error("'~' is only legal immediately after a step", 1),
            c if is_ident_start(c) && self.at_start => self.lex_undotted_child(),
            _ => self.error(format!("unexpected character '{c}'"), c.len_utf8()),
        }
    }

    fn lex_dot(&mut self) -> Lexeme {
        if self.remaining.starts_with("..") {
            if self.remaining[2..].starts_with("[?(") {
                let lex = self.make(LexKind::RecursiveFilterBegin, 5);
                self.mode = Mode::Filter;
                self.paren_depth = 1;
                return lex;
            }
            return self.make(LexKind::RecursiveDescent, 2);
        }

        let name_len = ident_len(&self.remaining[1..]);
        if name_len == 0 {
            return self.error("expected a property name after '.'", 1.min(self.remaining.len()));
        }
        let total = 1 + name_len;
        self.finish_child_lexeme(LexKind::DotChild, total, LexKind::PropertyName)
    }

    fn lex_undotted_child(&mut self) -> Lexeme {
        let name_len = ident_len(self.remaining);
        self.finish_child_lexeme(LexKind::UndottedChild, name_len, LexKind::PropertyName)
    }

    /// Builds a child lexeme covering `len` bytes, then folds in a trailing
    /// `~` if present, upgrading `base` to `as_property`.
    fn finish_child_lexeme(&mut self, base: LexKind, len: usize, as_property: LexKind) -> Lexeme {
        let start = self.offset;
        let mut total = len;
        let has_tilde = self.remaining[len..].starts_with('~');
        if has_tilde {
            total += 1;
        }
        let text = self.remaining[..total].to_string();
        self.advance_by(total);
        Lexeme {
            kind: if has_tilde { as_property } else { base },
            text,
            offset: start,
        }
    }

    fn lex_open_bracket(&mut self) -> Lexeme {
        if self.remaining[1..].starts_with("?(") {
            let lex = self.make(LexKind::FilterBegin, 3);
            self.mode = Mode::Filter;
            self.paren_depth = 1;
            return lex;
        }

        let body = &self.remaining[1..];
        let Some(close) = scan_bracket_body(body) else {
            return self.error("unterminated '[' — missing closing ']'", self.remaining.len());
        };

        let base = if body[..close].starts_with(['\'', '"']) {
            LexKind::BracketChild
        } else {
            LexKind::ArraySubscript
        };
        let as_property = match base {
            LexKind::BracketChild => LexKind::BracketPropertyName,
            _ => LexKind::ArraySubscriptProperty,
        };
        // Total length including both brackets.
        let total = 1 + close + 1;
        self.finish_child_lexeme(base, total, as_property)
    }

    // ---- filter mode ------------------------------------------------------

    fn next_filter_lexeme(&mut self) -> Lexeme {
        self.skip_filter_whitespace();
        if self.remaining.is_empty() {
            return self.error("unterminated filter — missing ')]'", 0);
        }

        let c = self.remaining.chars().next().unwrap();
        match c {
            '(' => {
                self.paren_depth += 1;
                self.make(LexKind::LParen, 1)
            }
            ')' => self.lex_filter_close_paren(),
            '&' if self.remaining.starts_with("&&") => self.make(LexKind::AndAnd, 2),
            '|' if self.remaining.starts_with("||") => self.make(LexKind::OrOr, 2),
            '=' if self.remaining.starts_with("==") => self.make(LexKind::EqEq, 2),
            '=' if self.remaining.starts_with("=~") => self.make(LexKind::RegexMatch, 2),
            '!' if self.remaining.starts_with("!=") => self.make(LexKind::Ne, 2),
            '!' => self.make(LexKind::Bang, 1),
            '<' if self.remaining.starts_with("<=") => self.make(LexKind::Le, 2),
            '<' => self.make(LexKind::Lt, 1),
            '>' if self.remaining.starts_with(">=") => self.make(LexKind::Ge, 2),
            '>' => self.make(LexKind::Gt, 1),
            '\'' => self.lex_filter_string(),
            '/' => self.lex_filter_regex(),
            '@' | '$' => self.lex_filter_path(c),
            c if c == '-' || c == '+' || c.is_ascii_digit() => self.lex_filter_number(),
            c if is_ident_start(c) => self.lex_filter_keyword(),
            c => self.error(format!("unexpected character '{c}' in filter"), c.len_utf8()),
        }
    }

    fn skip_filter_whitespace(&mut self) {
        let skip = self
            .remaining
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_whitespace())
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        if skip > 0 {
            self.advance_by(skip);
        }
    }

    fn lex_filter_close_paren(&mut self) -> Lexeme {
        if self.paren_depth > 1 {
            self.paren_depth -= 1;
            return self.make(LexKind::RParen, 1);
        }
        // This ')' closes the filter itself; it must be followed by ']'.
        if !self.remaining[1..].starts_with(']') {
            return self.error("expected ']' to close filter", self.remaining.len().min(2));
        }
        self.paren_depth = 0;
        self.mode = Mode::Path;
        self.make(LexKind::FilterEnd, 2)
    }

    fn lex_filter_string(&mut self) -> Lexeme {
        let body = &self.remaining[1..];
        let mut iter = body.char_indices();
        let end = loop {
            match iter.next() {
                None => return self.error("unterminated string literal", self.remaining.len()),
                Some((_, '\\')) => {
                    if iter.next().is_none() {
                        return self.error("unterminated string literal", self.remaining.len());
                    }
                }
                Some((i, '\'')) => break i,
                Some(_) => {}
            }
        };
        let total = 1 + end + 1;
        self.make(LexKind::Str, total)
    }

    fn lex_filter_regex(&mut self) -> Lexeme {
        let body = &self.remaining[1..];
        let mut iter = body.char_indices();
        let end = loop {
            match iter.next() {
                None => return self.error("unterminated regex literal", self.remaining.len()),
                Some((_, '\\')) => {
                    if iter.next().is_none() {
                        return self.error("unterminated regex literal", self.remaining.len());
                    }
                }
                Some((i, '/')) => break i,
                Some(_) => {}
            }
        };
        let total = 1 + end + 1;
        let lexeme = self.make(LexKind::Regex, total);
        let pattern = &lexeme.text[1..lexeme.text.len() - 1];
        if let Err(e) = regex::Regex::new(pattern) {
            return Lexeme {
                kind: LexKind::Error(format!("invalid regex /{pattern}/: {e}")),
                ..lexeme
            };
        }
        lexeme
    }

    fn lex_filter_number(&mut self) -> Lexeme {
        let bytes = self.remaining.as_bytes();
        let mut len = 0;
        if bytes[0] == b'-' || bytes[0] == b'+' {
            len += 1;
        }
        let mut has_fractional = false;
        let mut has_exponent = false;
        while len < bytes.len() {
            match bytes[len] {
                b'0'..=b'9' => len += 1,
                b'.' if !has_fractional && !has_exponent => {
                    has_fractional = true;
                    len += 1;
                }
                b'e' | b'E' if !has_exponent => {
                    has_exponent = true;
                    len += 1;
                    if len < bytes.len() && (bytes[len] == b'+' || bytes[len] == b'-') {
                        len += 1;
                    }
                }
                _ => break,
            }
        }
        let kind = if has_fractional || has_exponent {
            LexKind::Float
        } else {
            LexKind::Int
        };
        self.make(kind, len)
    }

    fn lex_filter_keyword(&mut self) -> Lexeme {
        let len = ident_len(self.remaining);
        let word = &self.remaining[..len];
        let kind = match word {
            "true" => LexKind::Bool(true),
            "false" => LexKind::Bool(false),
            "null" => LexKind::Null,
            other => {
                let msg = format!("unknown identifier '{other}' in filter");
                return self.error(msg, len);
            }
        };
        self.make(kind, len)
    }

    fn lex_filter_path(&mut self, sigil: char) -> Lexeme {
        let kind = if sigil == '@' {
            LexKind::PathAt
        } else {
            LexKind::PathRoot
        };
        let sigil_len = sigil.len_utf8();
        let tail_len = scan_path_tail(&self.remaining[sigil_len..]);
        let total = sigil_len + tail_len;
        let start = self.offset;
        let tail = self.remaining[sigil_len..total].to_string();
        self.advance_by(total);
        Lexeme {
            kind,
            text: tail,
            offset: start,
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Length in bytes of a `[A-Za-z_][A-Za-z0-9_-]*` identifier, or of a bare
/// `*`, at the start of `s`. Zero if neither is present.
fn ident_len(s: &str) -> usize {
    let mut chars = s.chars();
    match chars.next() {
        Some('*') => 1,
        Some(c) if is_ident_start(c) => {
            let mut len = c.len_utf8();
            for c in chars {
                if is_ident_continue(c) {
                    len += c.len_utf8();
                } else {
                    break;
                }
            }
            len
        }
        _ => 0,
    }
}

/// Finds the byte offset (relative to `s`) of the first unquoted `]` in
/// `s`, honoring `'`/`"`-quoted spans with `\`-escapes. Used to find the
/// extent of a bracket-child or array-subscript body.
fn scan_bracket_body(s: &str) -> Option<usize> {
    let mut iter = s.char_indices();
    let mut quote: Option<char> = None;
    while let Some((idx, c)) = iter.next() {
        if let Some(q) = quote {
            if c == '\\' {
                iter.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            ']' => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Scans a filter path-tail (the text following `@` or `$`), stopping at
/// the first top-level (bracket-depth zero) whitespace character or
/// comparison/logical operator, while correctly skipping over nested
/// brackets, quoted strings, and regex literals — which may themselves
/// contain such characters, e.g. inside a nested filter.
fn scan_path_tail(s: &str) -> usize {
    let mut iter = s.char_indices().peekable();
    let mut bracket_depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut in_regex = false;

    while let Some(&(idx, c)) = iter.peek() {
        if let Some(q) = quote {
            iter.next();
            if c == '\\' {
                iter.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if in_regex {
            iter.next();
            if c == '\\' {
                iter.next();
            } else if c == '/' {
                in_regex = false;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                iter.next();
            }
            '/' => {
                in_regex = true;
                iter.next();
            }
            '[' => {
                bracket_depth += 1;
                iter.next();
            }
            ']' => {
                bracket_depth -= 1;
                iter.next();
            }
            ')' if bracket_depth <= 0 => return idx,
            c if bracket_depth <= 0 && c.is_ascii_whitespace() => return idx,
            '=' | '!' | '<' | '>' | '&' | '|' if bracket_depth <= 0 => return idx,
            _ => {
                iter.next();
            }
        }
    }
    s.len()
}
