//! Vue single-file component block parser for vue-template-rs.
//!
//! Splits a `.vue` file into its top-level blocks without looking inside
//! them. The template compiler needs the raw template content together with
//! its byte offset in the file, which is what [`SfcBlock`] carries.
//!
//! # Example
//!
//! ```
//! use sfc_parser::parse_sfc;
//!
//! let source = "<template>\n  <div>{{ msg }}</div>\n</template>\n";
//! let result = parse_sfc(source);
//! let template = result.descriptor.template.unwrap();
//! assert_eq!(template.start, 10);
//! assert_eq!(template.content, "\n  <div>{{ msg }}</div>\n");
//! ```

mod descriptor;
mod error;
mod parser;

pub use descriptor::{AttrValue, SfcBlock, SfcDescriptor};
pub use error::{ParseError, ParseErrorKind};
pub use source_map::Span;

/// The result of parsing a single-file component.
#[derive(Debug)]
pub struct SfcParseResult {
    /// The blocks that were found.
    pub descriptor: SfcDescriptor,
    /// Problems found while scanning; blocks after a fatal one are missing.
    pub errors: Vec<ParseError>,
}

/// Parses the top-level blocks of a single-file component.
pub fn parse_sfc(source: &str) -> SfcParseResult {
    parser::Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let result = parse_sfc("");
        assert!(result.errors.is_empty());
        assert!(result.descriptor.template.is_none());
    }

    #[test]
    fn test_parse_all_block_kinds() {
        let source = "<template><p/></template>\n<script>export default {}</script>\n<style scoped>p{}</style>\n<docs>hi</docs>";
        let result = parse_sfc(source);
        assert!(result.errors.is_empty());
        let descriptor = result.descriptor;
        assert!(descriptor.template.is_some());
        assert_eq!(
            descriptor.script.map(|s| s.content).as_deref(),
            Some("export default {}")
        );
        assert_eq!(descriptor.styles.len(), 1);
        assert_eq!(descriptor.custom_blocks[0].block_type, "docs");
    }
}
