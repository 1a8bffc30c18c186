//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred while locating SFC blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An opening tag never reached its `>`.
    #[error("unclosed tag: <{tag_name}")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag_name: String,
    },

    /// A block has no matching closing tag.
    #[error("unclosed block: <{block_type}>")]
    UnclosedBlock {
        /// The block type (template, script, style, ...).
        block_type: String,
    },

    /// A second `<template>` or `<script>` block was found.
    #[error("duplicate <{block_type}> block, only the first one is used")]
    DuplicateBlock {
        /// The duplicated block type.
        block_type: String,
    },

    /// An HTML comment was never closed.
    #[error("unclosed comment")]
    UnclosedComment,
}
