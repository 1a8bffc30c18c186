//! Descriptor types for parsed single-file components.

use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Span;

/// The top-level blocks of a single-file component.
#[derive(Debug, Clone, Default)]
pub struct SfcDescriptor {
    /// The `<template>` block.
    pub template: Option<SfcBlock>,
    /// The `<script>` block.
    pub script: Option<SfcBlock>,
    /// All `<style>` blocks, in source order.
    pub styles: Vec<SfcBlock>,
    /// Any other top-level block (`<docs>`, `<i18n>`, ...).
    pub custom_blocks: Vec<SfcBlock>,
}

/// The value of a block attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Attribute written without a value, e.g. `functional`.
    Flag,
    /// Attribute with a value, quotes removed.
    Value(String),
}

impl AttrValue {
    /// Returns the attribute value, or `None` for a flag.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Flag => None,
            AttrValue::Value(value) => Some(value),
        }
    }
}

/// A single top-level block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfcBlock {
    /// The tag name (`template`, `script`, `style`, or a custom name).
    pub block_type: SmolStr,
    /// Text between the opening and closing tags.
    pub content: String,
    /// Byte offset of `content` in the file.
    pub start: usize,
    /// Byte offset just past `content` in the file.
    pub end: usize,
    /// The `lang` attribute.
    pub lang: Option<String>,
    /// The `src` attribute, referencing external content.
    pub src: Option<String>,
    /// Every attribute in source order.
    pub attrs: IndexMap<SmolStr, AttrValue>,
}

impl SfcBlock {
    /// Creates an inline block with no attributes.
    pub fn new(block_type: impl Into<SmolStr>, content: impl Into<String>, start: usize) -> Self {
        let content = content.into();
        let end = start + content.len();
        Self {
            block_type: block_type.into(),
            content,
            start,
            end,
            lang: None,
            src: None,
            attrs: IndexMap::new(),
        }
    }

    /// Adds an attribute, keeping `lang` and `src` in sync.
    pub fn with_attr(mut self, name: &str, value: AttrValue) -> Self {
        self.set_attr(name, value);
        self
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: AttrValue) {
        match (name, value.as_str()) {
            ("lang", Some(lang)) => self.lang = Some(lang.to_string()),
            ("src", Some(src)) => self.src = Some(src.to_string()),
            _ => {}
        }
        self.attrs.insert(SmolStr::new(name), value);
    }

    /// Returns an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Returns true if the block is marked `functional`.
    ///
    /// Any value counts, including `functional="false"`.
    pub fn is_functional(&self) -> bool {
        self.attrs.contains_key("functional")
    }

    /// The span of `content` in the file.
    pub fn content_span(&self) -> Span {
        Span::from_offsets(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_attrs_sync_lang_and_src() {
        let block = SfcBlock::new("template", "", 10)
            .with_attr("lang", AttrValue::Value("pug".into()))
            .with_attr("src", AttrValue::Value("./t.html".into()))
            .with_attr("functional", AttrValue::Flag);

        assert_eq!(block.lang.as_deref(), Some("pug"));
        assert_eq!(block.src.as_deref(), Some("./t.html"));
        assert!(block.is_functional());
        assert_eq!(
            block.attrs.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["lang", "src", "functional"]
        );
    }

    #[test]
    fn test_block_span() {
        let block = SfcBlock::new("template", "<div/>", 10);
        assert_eq!(block.end, 16);
        assert_eq!(block.content_span(), Span::new(10u32, 16u32));
    }
}
