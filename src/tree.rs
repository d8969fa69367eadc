//! The YAML node shape this crate queries.
//!
//! This mirrors the node record described by the query grammar: a `kind`,
//! a string `value`, a type `tag`, and an ordered `content` list. For a
//! `Mapping` node, `content` holds key/value nodes interleaved at even/odd
//! positions (`content[0]` is the first key, `content[1]` its value, and so
//! on). For a `Sequence`, `content` is simply the element list. For a
//! `Document`, `content[0]` is the root value.
//!
//! This crate does not parse or serialize YAML text — a real caller builds
//! this tree from whatever YAML front end they already use and hands the
//! result to [`crate::Path::find`]. The constructors here exist so this
//! crate (and its tests) can build trees directly.

use std::fmt;
use std::rc::Rc;

/// The kind of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

/// A YAML type tag, e.g. `!!int`, `!!str`, or an implicit/custom tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    pub fn new(s: impl Into<String>) -> Self {
        Tag(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub const TAG_STR: &str = "!!str";
pub const TAG_INT: &str = "!!int";
pub const TAG_FLOAT: &str = "!!float";
pub const TAG_BOOL: &str = "!!bool";
pub const TAG_NULL: &str = "!!null";

#[derive(Debug, PartialEq)]
struct NodeData {
    kind: Kind,
    value: String,
    tag: Tag,
    content: Vec<Node>,
}

/// A node in a YAML document tree.
///
/// Cheaply cloneable (it's a reference-counted handle); this crate never
/// mutates a `Node` it's given, and a compiled [`crate::Path`] hands back
/// the very same `Node` handles it was evaluated against, so a consumer is
/// free to mutate the underlying document through them after `find`
/// returns.
#[derive(Clone, PartialEq)]
pub struct Node(Rc<NodeData>);

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.0.kind)
            .field("value", &self.0.value)
            .field("tag", &self.0.tag)
            .field("content", &self.0.content.len())
            .finish()
    }
}

impl Node {
    fn new(kind: Kind, value: impl Into<String>, tag: Tag, content: Vec<Node>) -> Self {
        Node(Rc::new(NodeData {
            kind,
            value: value.into(),
            tag,
            content,
        }))
    }

    /// A scalar leaf node, e.g. a string, number, or boolean value.
    pub fn scalar(value: impl Into<String>, tag: impl Into<String>) -> Self {
        Node::new(Kind::Scalar, value, Tag::new(tag.into()), Vec::new())
    }

    /// Shorthand for a `!!str` scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Node::scalar(value, TAG_STR)
    }

    /// A mapping node. `pairs` are (key, value) nodes; they're flattened
    /// into the interleaved `content` representation internally.
    pub fn mapping(pairs: impl IntoIterator<Item = (Node, Node)>) -> Self {
        let mut content = Vec::new();
        for (k, v) in pairs {
            content.push(k);
            content.push(v);
        }
        Node::new(Kind::Mapping, "", Tag::new("!!map"), content)
    }

    /// A sequence node.
    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Node::new(
            Kind::Sequence,
            "",
            Tag::new("!!seq"),
            items.into_iter().collect(),
        )
    }

    /// A document node wrapping a single root value.
    pub fn document(root: Node) -> Self {
        Node::new(Kind::Document, "", Tag::new(""), vec![root])
    }

    /// An alias node pointing at an anchor name. This crate never resolves
    /// aliases — they're treated as opaque scalars bearing the anchor name.
    pub fn alias(anchor: impl Into<String>) -> Self {
        Node::new(Kind::Alias, anchor, Tag::new("!!alias"), Vec::new())
    }

    pub fn kind(&self) -> Kind {
        self.0.kind
    }

    pub fn value(&self) -> &str {
        &self.0.value
    }

    pub fn tag(&self) -> &Tag {
        &self.0.tag
    }

    pub fn content(&self) -> &[Node] {
        &self.0.content
    }

    /// Identity comparison: do these two handles point at the same node?
    pub fn is_same(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Unwraps a `Document` node to its root value. Non-document nodes are
    /// returned unchanged.
    pub fn unwrap_document(&self) -> Node {
        if self.kind() == Kind::Document {
            self.0
                .content
                .first()
                .cloned()
                .unwrap_or_else(|| Node::scalar("", TAG_NULL))
        } else {
            self.clone()
        }
    }

    /// For a `Mapping` node, iterates the (key, value) pairs in document
    /// order. Empty for any other kind.
    pub fn pairs(&self) -> impl Iterator<Item = (&Node, &Node)> {
        let content = if self.kind() == Kind::Mapping {
            self.0.content.as_slice()
        } else {
            &[]
        };
        content.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }
}
