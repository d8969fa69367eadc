//! The compiled path: a chain of [`compile::Step`]s plus the two public
//! entry points that build one (`new_path`/`new_path_with_options`) and
//! evaluate it (`Path::find`).

mod compile;
mod eval;

use crate::tree::Node;
use crate::Error;

/// Options controlling path compilation.
///
/// The one thing a pure, synchronous query compiler needs guarding is a
/// pathological input string compiling into an unbounded step chain.
#[derive(Debug, Clone, Copy)]
pub struct PathOptions {
    max_steps: Option<usize>,
}

impl Default for PathOptions {
    fn default() -> Self {
        PathOptions { max_steps: None }
    }
}

impl PathOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of compiled steps. A path string that would compile
    /// to more than `max` steps fails with [`Error`] instead of building
    /// an unbounded matcher chain.
    pub fn max_steps(mut self, max: usize) -> Self {
        self.max_steps = Some(max);
        self
    }
}

/// A compiled, reusable query. Immutable once built and `Send + Sync`
/// (it's just a `Vec` of steps plus any regexes compiled into filter
/// expressions, which are themselves thread-safe), so the same `Path` may
/// be evaluated concurrently against distinct document roots.
#[derive(Debug, Clone)]
pub struct Path {
    steps: Vec<compile::Step>,
}

impl Path {
    pub(crate) fn compile(text: &str, options: &PathOptions) -> Result<Path, Error> {
        let steps = compile::compile(text, options)?;
        Ok(Path { steps })
    }

    /// Evaluates this path against `root`, returning every matching node
    /// in document order. Never fails: incompatible node kinds, missing
    /// keys, and out-of-range indices all silently contribute nothing.
    pub fn find(&self, root: &Node) -> Vec<Node> {
        let _span = tracing::trace_span!("path_find", steps = self.steps.len()).entered();
        let root = root.unwrap_document();
        eval::apply_chain(&self.steps, root.clone(), &root).collect()
    }

    /// Evaluates this path starting from `node` while keeping `root` as
    /// the document root for any `$`-rooted sub-queries nested inside a
    /// filter. Used internally to evaluate a filter's `@`/`$` path-query
    /// operands; not exposed publicly since a top-level `find` always
    /// starts at the root.
    pub(crate) fn find_from(&self, node: &Node, root: &Node) -> Vec<Node> {
        eval::apply_chain(&self.steps, node.clone(), root).collect()
    }
}

/// Compiles `text` into a reusable [`Path`] with default options.
pub fn new_path(text: &str) -> Result<Path, Error> {
    new_path_with_options(text, PathOptions::default())
}

/// Compiles `text` into a reusable [`Path`], applying `options`.
pub fn new_path_with_options(text: &str, options: PathOptions) -> Result<Path, Error> {
    let _span = tracing::trace_span!("path_compile", len = text.len()).entered();
    Path::compile(text, &options)
}

/// Compiles a filter's `@`/`$` path-tail (the text following the sigil,
/// never including it) into a `Path`, reusing the exact same grammar as a
/// top-level path string.
pub(crate) fn compile_fragment(text: &str) -> Result<Path, Error> {
    Path::compile(text, &PathOptions::default())
}
