//! Evaluates a parsed filter [`Expr`] against a candidate node.
//!
//! A comparison's two sides each resolve to a list of values (a
//! `PathQuery` may match zero, one, or many nodes); per the grammar, a
//! comparison holds only if it holds for **every** pairing drawn from the
//! two lists, and is false outright if either list is empty.

use crate::filter::ast::{CmpOp, Expr, Origin};
use crate::filter::value::Value;
use crate::tree::Node;

pub(crate) fn eval(expr: &Expr, context: &Node, root: &Node) -> bool {
    match expr {
        Expr::And(a, b) => eval(a, context, root) && eval(b, context, root),
        Expr::Or(a, b) => eval(a, context, root) || eval(b, context, root),
        Expr::Not(a) => !eval(a, context, root),
        Expr::Exists(inner) => !values_of(inner, context, root).is_empty(),
        Expr::BinaryOp(lhs, CmpOp::RegexMatch, rhs) => {
            let Expr::Regex(re) = rhs.as_ref() else {
                return false;
            };
            let lhs_vals = values_of(lhs, context, root);
            !lhs_vals.is_empty() && lhs_vals.iter().all(|v| v.matches_regex(re))
        }
        Expr::BinaryOp(lhs, op, rhs) => {
            let lhs_vals = values_of(lhs, context, root);
            let rhs_vals = values_of(rhs, context, root);
            compare_lists(*op, &lhs_vals, &rhs_vals)
        }
        // A bare literal, regex, or path-query never appears as the root
        // of a well-formed filter expression — the parser always wraps a
        // bare path-query in `Exists`.
        Expr::Literal(_) | Expr::Regex(_) | Expr::PathQuery(..) => false,
    }
}

fn values_of(expr: &Expr, context: &Node, root: &Node) -> Vec<Value> {
    match expr {
        Expr::Literal(v) => vec![v.clone()],
        Expr::PathQuery(origin, sub_path) => {
            let base = match origin {
                Origin::At => context,
                Origin::Root => root,
            };
            sub_path
                .find_from(base, root)
                .iter()
                .map(Value::from_node)
                .collect()
        }
        _ => Vec::new(),
    }
}

fn compare_lists(op: CmpOp, lhs: &[Value], rhs: &[Value]) -> bool {
    if lhs.is_empty() || rhs.is_empty() {
        return false;
    }
    lhs.iter().all(|a| rhs.iter().all(|b| compare_one(op, a, b)))
}

fn compare_one(op: CmpOp, a: &Value, b: &Value) -> bool {
    use std::cmp::Ordering::*;
    match op {
        CmpOp::Eq => a.eq(b),
        CmpOp::Ne => !a.eq(b),
        CmpOp::Lt => a.partial_cmp(b) == Some(Less),
        CmpOp::Le => matches!(a.partial_cmp(b), Some(Less) | Some(Equal)),
        CmpOp::Gt => a.partial_cmp(b) == Some(Greater),
        CmpOp::Ge => matches!(a.partial_cmp(b), Some(Greater) | Some(Equal)),
        CmpOp::RegexMatch => false, // handled separately in `eval`
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse;
    use crate::lexer::{LexKind, Lexer};
    use crate::tree::{Node, TAG_INT};

    fn parse_filter(body: &str) -> Expr {
        let wrapped = format!("[?({body})]");
        let mut lexer = Lexer::new(&wrapped);
        lexer.next_lexeme();
        let mut tokens = Vec::new();
        loop {
            let lex = lexer.next_lexeme();
            if matches!(lex.kind, LexKind::FilterEnd | LexKind::Eof) {
                break;
            }
            tokens.push(lex);
        }
        parse(&tokens).unwrap()
    }

    fn container(name: &str, port: i64) -> Node {
        Node::mapping([
            (Node::string("name"), Node::string(name)),
            (Node::string("port"), Node::scalar(port.to_string(), TAG_INT)),
        ])
    }

    #[test]
    fn equality_on_matching_child() {
        let expr = parse_filter("@.name=='nginx'");
        let node = container("nginx", 80);
        assert!(eval(&expr, &node, &node));
        let other = container("redis", 80);
        assert!(!eval(&expr, &other, &other));
    }

    #[test]
    fn numeric_comparison() {
        let expr = parse_filter("@.port>80");
        assert!(eval(&expr, &container("a", 81), &container("a", 81)));
        assert!(!eval(&expr, &container("a", 80), &container("a", 80)));
    }

    #[test]
    fn missing_field_compares_false_not_error() {
        let expr = parse_filter("@.missing==1");
        let node = container("a", 1);
        assert!(!eval(&expr, &node, &node));
    }

    #[test]
    fn and_or_not() {
        let node = container("nginx", 81);
        assert!(eval(
            &parse_filter("@.name=='nginx' && @.port>80"),
            &node,
            &node
        ));
        assert!(eval(&parse_filter("@.name=='x' || @.port>80"), &node, &node));
        assert!(eval(&parse_filter("!(@.name=='x')"), &node, &node));
    }
}
