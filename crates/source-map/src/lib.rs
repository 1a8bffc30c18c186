//! Source position tracking and v3 source map generation for vue-template-rs.
//!
//! A compiled template block keeps the line and column layout of the block it
//! came from, so a map only needs a constant line shift per call. See
//! [`generate_source_map`].

mod builder;
mod error;
mod line_index;
mod raw;
mod span;

pub use builder::{generate_source_map, split_lines, Mapping, Position};
pub use error::SourceMapError;
pub use line_index::{LineCol, LineIndex};
pub use raw::RawSourceMap;
pub use span::{ByteOffset, Span};
