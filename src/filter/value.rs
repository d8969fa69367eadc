//! The typed value lattice filter comparisons operate on.
//!
//! A filter comparison's two sides each evaluate to a *list* of `Value`s
//! (a path-query can match zero, one, or many nodes); [`super::eval`]
//! handles the list-to-list comparison, this module only handles comparing
//! one `Value` to another.

use std::cmp::Ordering;

use crate::tree::{Kind, Node, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_NULL};

#[derive(Debug, Clone)]
pub(crate) enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Str(String),
    Node(Node),
}

impl Value {
    /// Converts a matched tree node to a comparable value: a `Scalar`
    /// becomes the value its tag implies (falling back to `Str` if the
    /// scalar text doesn't actually parse as its tag claims), anything
    /// else (`Mapping`, `Sequence`, `Alias`, `Document`) stays a `Node` and
    /// only compares equal to another structurally identical node.
    pub(crate) fn from_node(node: &Node) -> Value {
        if node.kind() != Kind::Scalar {
            return Value::Node(node.clone());
        }
        match node.tag().as_str() {
            TAG_INT => node
                .value()
                .parse::<i64>()
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Str(node.value().to_string())),
            TAG_FLOAT => node
                .value()
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Str(node.value().to_string())),
            TAG_BOOL => node
                .value()
                .parse::<bool>()
                .map(Value::Bool)
                .unwrap_or_else(|_| Value::Str(node.value().to_string())),
            TAG_NULL => Value::Null,
            _ => Value::Str(node.value().to_string()),
        }
    }

    pub(crate) fn eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Bool(a), Bool(b)) => a == b,
            (Null, Null) => true,
            (Str(a), Str(b)) => a == b,
            (Node(a), Node(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering is only ever defined between two numeric values; any other
    /// pairing (including two strings) has no ordering, so `<`/`<=`/`>`/
    /// `>=` against it is false.
    pub(crate) fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            _ => None,
        }
    }

    pub(crate) fn matches_regex(&self, re: &regex::Regex) -> bool {
        match self {
            Value::Str(s) => re.is_match(s),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_float_compare_across_kinds() {
        assert!(Value::Int(2).eq(&Value::Float(2.0)));
        assert_eq!(
            Value::Int(1).partial_cmp(&Value::Float(2.0)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn mismatched_kinds_are_unequal_not_erroring() {
        assert!(!Value::Str("1".into()).eq(&Value::Int(1)));
        assert_eq!(Value::Bool(true).partial_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn strings_have_no_ordering() {
        assert_eq!(
            Value::Str("a".into()).partial_cmp(&Value::Str("m".into())),
            None
        );
    }

    #[test]
    fn scalar_node_converts_by_tag() {
        let n = Node::scalar("42", TAG_INT);
        assert!(matches!(Value::from_node(&n), Value::Int(42)));
    }
}
