//! Compiles and resolves an array-subscript body (the text between `[` and
//! `]` for an `ArraySubscript` lexeme) against a sequence of a given
//! length.
//!
//! Parsing is split into a compile-time pass ([`compile`]) that validates
//! syntax — so a malformed subscript such as a zero step fails when the
//! path is compiled, not when it's evaluated — and an eval-time pass
//! ([`Subscript::resolve`]) that's purely arithmetic and therefore
//! infallible, consistent with evaluation never failing.

use crate::Error;

#[derive(Debug, Clone)]
pub(crate) struct Subscript(Vec<Member>);

#[derive(Debug, Clone)]
enum Member {
    Star,
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: i64,
    },
}

/// Validates `spec` (e.g. `"*"`, `"-1"`, `"1:3"`, `"0,2,4"`) and compiles
/// it into a reusable [`Subscript`].
pub(crate) fn compile(spec: &str, offset: usize) -> Result<Subscript, Error> {
    let members = split_top_level_commas(spec)
        .into_iter()
        .map(|m| compile_member(m, offset))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Subscript(members))
}

impl Subscript {
    /// Resolves against a sequence of length `len`, returning the indices
    /// to visit in order. Indices are always `< len`.
    pub(crate) fn resolve(&self, len: usize) -> Vec<usize> {
        let mut out = Vec::new();
        for member in &self.0 {
            match member {
                Member::Star => out.extend(0..len),
                Member::Index(i) => out.extend(normalize_index(*i, len)),
                Member::Slice { start, end, step } => {
                    out.extend(resolve_slice(*start, *end, *step, len))
                }
            }
        }
        out
    }
}

fn compile_member(member: &str, offset: usize) -> Result<Member, Error> {
    let member = member.trim();
    if member == "*" {
        return Ok(Member::Star);
    }
    if let Some(first_colon) = member.find(':') {
        let rest = &member[first_colon + 1..];
        let (end_part, step_part) = match rest.find(':') {
            Some(i) => (&rest[..i], Some(&rest[i + 1..])),
            None => (rest, None),
        };
        let start_part = &member[..first_colon];

        let step = match step_part {
            None | Some("") => 1,
            Some(s) => parse_bound(s, offset)?,
        };
        if step == 0 {
            return Err(Error::new("slice step must not be zero", member, offset));
        }
        let start = parse_optional_bound(start_part, offset)?;
        let end = parse_optional_bound(end_part, offset)?;
        return Ok(Member::Slice { start, end, step });
    }
    Ok(Member::Index(parse_bound(member, offset)?))
}

fn parse_optional_bound(s: &str, offset: usize) -> Result<Option<i64>, Error> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(parse_bound(s, offset)?))
    }
}

fn parse_bound(s: &str, offset: usize) -> Result<i64, Error> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| Error::new(format!("invalid array subscript member '{s}'"), s, offset))
}

/// Normalizes a JSONPath-style index (negative counts from the end) to an
/// in-bounds `usize`, or `None` if it falls outside `0..len`.
fn normalize_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if i < 0 { len + i } else { i };
    (resolved >= 0 && resolved < len).then_some(resolved as usize)
}

fn resolve_slice(start: Option<i64>, end: Option<i64>, step: i64, len: usize) -> Vec<usize> {
    let len_i = len as i64;
    let forward = step > 0;
    let default_start = if forward { 0 } else { len_i - 1 };
    let default_end = if forward { len_i } else { -len_i - 1 };

    let start = clamp_slice_bound(start.unwrap_or(default_start), len_i, forward);
    let end = clamp_slice_bound(end.unwrap_or(default_end), len_i, forward);

    let mut out = Vec::new();
    if forward {
        let mut i = start;
        while i < end {
            out.push(i as usize);
            i += step;
        }
    } else {
        let mut i = start;
        while i > end {
            if i < len_i {
                out.push(i as usize);
            }
            i += step;
        }
    }
    out
}

/// JSONPath's slice-clamping rule: a negative bound counts from the end,
/// then the result clamps into `[0, len]` (forward step) or
/// `[-1, len - 1]` (backward step).
fn clamp_slice_bound(i: i64, len: i64, forward: bool) -> i64 {
    let resolved = if i < 0 {
        (len + i).max(if forward { 0 } else { -1 })
    } else {
        i
    };
    if forward {
        resolved.clamp(0, len)
    } else {
        resolved.clamp(-1, len - 1)
    }
}

/// Splits `s` on `,` characters that are not inside a `'...'`/`"..."`
/// span, matching the bracket-child splitting rule.
pub(crate) fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut chars = s.char_indices();
    while let Some((idx, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            ',' => {
                out.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push(&s[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(spec: &str, len: usize) -> Vec<usize> {
        compile(spec, 0).unwrap().resolve(len)
    }

    #[test]
    fn star_is_every_index() {
        assert_eq!(resolve("*", 3), vec![0, 1, 2]);
    }

    #[test]
    fn single_negative_index() {
        assert_eq!(resolve("-1", 3), vec![2]);
    }

    #[test]
    fn single_out_of_range_index_is_empty() {
        assert_eq!(resolve("5", 3), Vec::<usize>::new());
    }

    #[test]
    fn basic_range() {
        assert_eq!(resolve("1:3", 5), vec![1, 2]);
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(resolve(":2", 5), vec![0, 1]);
        assert_eq!(resolve("2:", 5), vec![2, 3, 4]);
    }

    #[test]
    fn negative_step_reverses() {
        assert_eq!(resolve("::-1", 3), vec![2, 1, 0]);
    }

    #[test]
    fn union_of_members() {
        assert_eq!(resolve("0,2,4", 5), vec![0, 2, 4]);
    }

    #[test]
    fn zero_step_is_a_compile_error() {
        assert!(compile("1:2:0", 0).is_err());
    }

    #[test]
    fn negative_start_beyond_length_clamps() {
        assert_eq!(resolve("-100:2", 5), vec![0, 1]);
    }
}
