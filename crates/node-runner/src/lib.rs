//! Node.js process runner for the Vue 2 template compiler.

mod runner;
mod script;

pub use runner::{NodeError, NodeRunner};
