//! GLSL text tooling for the effect composition engine
//!
//! This crate provides:
//! - Whole-word symbol renaming for collision-free shader merging
//! - Shader-convention scanning (function names, varyings, entry points)
//! - The blend-function vocabulary and its canonical GLSL snippets
//!
//! Shader fragments are handled as plain text by convention; nothing here
//! parses GLSL into an AST.

pub mod blend;
pub mod rewrite;

pub use blend::BlendFunction;
pub use rewrite::{
    capitalize, find_function_names, find_varying_names, prefix_substrings,
};
