//! Document adapters

mod tree;

pub use tree::{DomError, DomTree, ImageSpec};
