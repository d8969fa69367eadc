//! End-to-end scenarios against a single Deployment-shaped document,
//! built directly with [`tree::Node`] constructors rather than parsed
//! from YAML text.

use crate::tree::{Node, TAG_INT};
use crate::{new_path, new_path_with_options, PathOptions};
use pretty_assertions::assert_eq;

fn container(name: &str, image: &str, ports: Vec<i64>) -> Node {
    let ports = Node::sequence(ports.into_iter().map(|p| {
        Node::mapping([(
            Node::string("containerPort"),
            Node::scalar(p.to_string(), TAG_INT),
        )])
    }));
    Node::mapping([
        (Node::string("name"), Node::string(name)),
        (Node::string("image"), Node::string(image)),
        (Node::string("ports"), ports),
    ])
}

fn deployment() -> Node {
    let containers = Node::sequence([
        container("nginx", "nginx:1.25", vec![80, 443]),
        container("sidecar", "envoy:1.29", vec![9901]),
    ]);
    let spec = Node::mapping([(Node::string("containers"), containers)]);
    let root = Node::mapping([
        (Node::string("apiVersion"), Node::string("apps/v1")),
        (Node::string("kind"), Node::string("Deployment")),
        (Node::string("spec"), spec),
    ]);
    Node::document(root)
}

fn values(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(Node::value).collect()
}

#[test]
fn recursive_descent_collects_all_images() {
    let path = new_path("$..spec.containers[*].image").unwrap();
    let found = path.find(&deployment());
    assert_eq!(values(&found), vec!["nginx:1.25", "envoy:1.29"]);
}

#[test]
fn filter_by_name_selects_one_container_image() {
    let path = new_path("$..containers[?(@.name=='nginx')].image").unwrap();
    let found = path.find(&deployment());
    assert_eq!(values(&found), vec!["nginx:1.25"]);
}

#[test]
fn recursive_descent_collects_all_container_ports() {
    let path = new_path("$..ports[*].containerPort").unwrap();
    let found = path.find(&deployment());
    assert_eq!(values(&found), vec!["80", "443", "9901"]);
}

#[test]
fn negative_index_selects_last_container_name() {
    let path = new_path("$.spec.containers[-1].name").unwrap();
    let found = path.find(&deployment());
    assert_eq!(values(&found), vec!["sidecar"]);
}

#[test]
fn wildcard_subscript_has_no_singular_property_name() {
    let path = new_path("$.spec.containers[*]~").unwrap();
    let found = path.find(&deployment());
    assert!(found.is_empty());
}

#[test]
fn nested_filter_over_container_ports() {
    let path = new_path("$..containers[?(@.ports[?(@.containerPort>80)])].name").unwrap();
    let found = path.find(&deployment());
    // nginx has a port > 80 (443); sidecar's only port is 9901.
    assert_eq!(values(&found), vec!["nginx", "sidecar"]);
}

#[test]
fn unopened_bracket_is_a_compile_error() {
    assert!(new_path("$.[").is_err());
}

#[test]
fn property_name_not_at_end_is_a_compile_error() {
    assert!(new_path("$.a~.b").is_err());
}

#[test]
fn zero_step_slice_is_a_compile_error() {
    assert!(new_path("$[1:2:0]").is_err());
}

#[test]
fn step_limit_option_rejects_overlong_paths() {
    let opts = PathOptions::new().max_steps(2);
    let err = new_path_with_options("$.spec.containers[*]", opts).unwrap_err();
    assert!(err.message().contains("limit"));
}

#[test]
fn a_compiled_path_is_reusable_across_roots() {
    let path = new_path("$.kind").unwrap();
    let first = deployment();
    let second = Node::document(Node::mapping([(
        Node::string("kind"),
        Node::string("Service"),
    )]));
    assert_eq!(values(&path.find(&first)), vec!["Deployment"]);
    assert_eq!(values(&path.find(&second)), vec!["Service"]);
}
