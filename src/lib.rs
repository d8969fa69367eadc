#![doc = include_str!("../README.md")]

mod error;
mod filter;
mod lexer;
mod path;
mod slice;
pub mod tree;

#[cfg(test)]
mod tests;

pub use crate::error::Error;
pub use crate::path::{new_path, new_path_with_options, Path, PathOptions};
pub use crate::tree::Node;
