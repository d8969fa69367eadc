//! Interprets a compiled step chain against a node.
//!
//! Each step is a function `(node, root) -> nodes`; the chain is composed
//! left to right via `flat_map`, lazily — per the grammar, no step running
//! out ahead and building an intermediate `Vec` until the final
//! `Path::find` collects the results.

use std::iter;

use crate::filter::ast::Expr;
use crate::path::compile::{ChildName, Step};
use crate::tree::{Kind, Node};

/// Applies `steps` to `node`, threading the unchanging document `root`
/// through for any `$`-rooted sub-queries nested inside filters.
pub(crate) fn apply_chain<'a>(
    steps: &'a [Step],
    node: Node,
    root: &'a Node,
) -> Box<dyn Iterator<Item = Node> + 'a> {
    match steps.split_first() {
        None => Box::new(iter::once(node)),
        Some((step, rest)) => {
            let matched = apply_step(step, &node, root);
            Box::new(matched.into_iter().flat_map(move |n| apply_chain(rest, n, root)))
        }
    }
}

fn apply_step(step: &Step, node: &Node, root: &Node) -> Vec<Node> {
    match step {
        Step::Identity => vec![node.clone()],
        Step::Root => vec![root.clone()],
        Step::Child { name, as_property } => apply_child(name, *as_property, node),
        Step::Subscript {
            spec,
            as_property,
            is_wildcard,
        } => apply_subscript(spec, *as_property, *is_wildcard, node),
        Step::Recurse(inner) => descendants_and_self(node)
            .into_iter()
            .flat_map(|n| apply_step(inner, &n, root))
            .collect(),
        Step::Filter(expr) => apply_filter(expr, node, root),
    }
}

fn apply_child(name: &ChildName, as_property: bool, node: &Node) -> Vec<Node> {
    if node.kind() != Kind::Mapping {
        return Vec::new();
    }
    node.pairs()
        .filter(|(k, _)| child_name_matches(name, k.value()))
        .map(|(k, v)| if as_property { Node::string(k.value()) } else { v.clone() })
        .collect()
}

fn child_name_matches(name: &ChildName, key: &str) -> bool {
    match name {
        ChildName::Wildcard => true,
        ChildName::Named(n) => n == key,
        ChildName::BracketList(names) => names.iter().any(|n| n == key),
    }
}

fn apply_subscript(
    spec: &crate::slice::Subscript,
    as_property: bool,
    is_wildcard: bool,
    node: &Node,
) -> Vec<Node> {
    if node.kind() != Kind::Sequence {
        return Vec::new();
    }
    if as_property && is_wildcard {
        return Vec::new();
    }
    let content = node.content();
    spec.resolve(content.len())
        .into_iter()
        .filter_map(|i| {
            content.get(i).map(|v| {
                if as_property {
                    Node::string(i.to_string())
                } else {
                    v.clone()
                }
            })
        })
        .collect()
}

fn apply_filter(expr: &Expr, node: &Node, root: &Node) -> Vec<Node> {
    match node.kind() {
        Kind::Sequence => node
            .content()
            .iter()
            .filter(|elem| crate::filter::eval::eval(expr, elem, root))
            .cloned()
            .collect(),
        // Non-Sequence input is a guard on the node itself, not an
        // iteration over its contents: a Mapping's own values are not its
        // filter candidates.
        _ => {
            if crate::filter::eval::eval(expr, node, root) {
                vec![node.clone()]
            } else {
                Vec::new()
            }
        }
    }
}

/// `node` itself, followed by every node reachable below it in document
/// order (mapping values and keys are not both descended into — only
/// values — and sequence elements, recursively).
fn descendants_and_self(node: &Node) -> Vec<Node> {
    let mut out = vec![node.clone()];
    match node.kind() {
        Kind::Mapping => {
            for (_, v) in node.pairs() {
                out.extend(descendants_and_self(v));
            }
        }
        Kind::Sequence => {
            for v in node.content() {
                out.extend(descendants_and_self(v));
            }
        }
        Kind::Document => {
            for v in node.content() {
                out.extend(descendants_and_self(v));
            }
        }
        Kind::Scalar | Kind::Alias => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::tree::TAG_INT;

    fn deployment() -> Node {
        let container = |name: &str, port: i64| {
            Node::mapping([
                (Node::string("name"), Node::string(name)),
                (
                    Node::string("ports"),
                    Node::sequence([Node::mapping([(
                        Node::string("containerPort"),
                        Node::scalar(port.to_string(), TAG_INT),
                    )])]),
                ),
            ])
        };
        Node::document(Node::mapping([(
            Node::string("spec"),
            Node::mapping([(
                Node::string("containers"),
                Node::sequence([container("nginx", 80), container("sidecar", 90)]),
            )]),
        )]))
    }

    #[test]
    fn recursive_descent_finds_nested_values() {
        let doc = deployment();
        let path = Path::compile("$..containers[*].name", &Default::default()).unwrap();
        let names: Vec<_> = path.find(&doc).iter().map(|n| n.value().to_string()).collect();
        assert_eq!(names, vec!["nginx", "sidecar"]);
    }

    #[test]
    fn filter_by_equality() {
        let doc = deployment();
        let path = Path::compile("$..containers[?(@.name=='nginx')].name", &Default::default()).unwrap();
        let names: Vec<_> = path.find(&doc).iter().map(|n| n.value().to_string()).collect();
        assert_eq!(names, vec!["nginx"]);
    }

    #[test]
    fn negative_index_selects_last() {
        let doc = deployment();
        let path = Path::compile("$.spec.containers[-1].name", &Default::default()).unwrap();
        let names: Vec<_> = path.find(&doc).iter().map(|n| n.value().to_string()).collect();
        assert_eq!(names, vec!["sidecar"]);
    }

    #[test]
    fn property_name_on_sequence_step_is_empty_for_scalar_terminal() {
        let doc = deployment();
        // `[*]~` on containers asks for property names of sequence
        // elements, which sequences don't have — no panics, no matches.
        let path = Path::compile("$.spec.containers[*]~", &Default::default()).unwrap();
        assert!(path.find(&doc).is_empty());
    }

    #[test]
    fn nested_filter_existence() {
        let doc = deployment();
        let path = Path::compile(
            "$..containers[?(@.ports[?(@.containerPort>80)])].name",
            &Default::default(),
        )
        .unwrap();
        let names: Vec<_> = path.find(&doc).iter().map(|n| n.value().to_string()).collect();
        assert_eq!(names, vec!["sidecar"]);
    }

    #[test]
    fn filter_on_non_sequence_is_a_guard_on_the_node_itself() {
        // A filter applied to a Mapping tests the mapping as a whole, not
        // its individual values.
        let matching = Node::mapping([(Node::string("name"), Node::string("nginx"))]);
        let other = Node::mapping([(Node::string("name"), Node::string("redis"))]);
        let expr = crate::filter::parser::parse(&tokenize_filter("@.name=='nginx'")).unwrap();

        assert_eq!(apply_filter(&expr, &matching, &matching), vec![matching.clone()]);
        assert!(apply_filter(&expr, &other, &other).is_empty());
    }

    fn tokenize_filter(body: &str) -> Vec<crate::lexer::Lexeme> {
        let wrapped = format!("[?({body})]");
        let mut lexer = crate::lexer::Lexer::new(&wrapped);
        lexer.next_lexeme();
        let mut tokens = Vec::new();
        loop {
            let lex = lexer.next_lexeme();
            if matches!(lex.kind, crate::lexer::LexKind::FilterEnd | crate::lexer::LexKind::Eof) {
                break;
            }
            tokens.push(lex);
        }
        tokens
    }
}
