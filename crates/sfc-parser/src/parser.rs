//! Top-level block scanner.
//!
//! Only the outermost structure of the file is recognized. Block content is
//! kept verbatim; `<script>` and `<style>` are raw text, while nested
//! `<template>` tags inside a template block are balanced.

use crate::descriptor::{AttrValue, SfcBlock, SfcDescriptor};
use crate::error::{ParseError, ParseErrorKind};
use crate::SfcParseResult;
use source_map::Span;
use tracing::trace;

pub(crate) struct Parser<'a> {
    source: &'a str,
    pos: usize,
    descriptor: SfcDescriptor,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            descriptor: SfcDescriptor::default(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn parse(mut self) -> SfcParseResult {
        while let Some(rel) = self.source[self.pos..].find('<') {
            let tag_start = self.pos + rel;
            let rest = &self.source[tag_start..];

            if rest.starts_with("<!--") {
                match rest.find("-->") {
                    Some(end) => self.pos = tag_start + end + 3,
                    None => {
                        self.error(ParseErrorKind::UnclosedComment, tag_start);
                        break;
                    }
                }
                continue;
            }

            // Stray closing tags, doctypes and processing instructions
            if rest.starts_with("</") || rest.starts_with("<!") || rest.starts_with("<?") {
                self.pos = rest
                    .find('>')
                    .map(|end| tag_start + end + 1)
                    .unwrap_or(self.source.len());
                continue;
            }

            let name_len = rest[1..]
                .find(|c: char| !is_tag_name_char(c))
                .unwrap_or(rest.len() - 1);
            if name_len == 0 {
                self.pos = tag_start + 1;
                continue;
            }

            let name = &rest[1..1 + name_len];
            match self.parse_block(tag_start, name) {
                Some(next) => self.pos = next,
                None => break,
            }
        }

        SfcParseResult {
            descriptor: self.descriptor,
            errors: self.errors,
        }
    }

    /// Parses one block starting at `<name`. Returns the offset after its
    /// closing tag, or `None` when the rest of the file is unusable.
    fn parse_block(&mut self, tag_start: usize, name: &str) -> Option<usize> {
        let mut block = SfcBlock::new(name, "", 0);
        let mut cursor = tag_start + 1 + name.len();

        let content_start = loop {
            cursor = self.skip_whitespace(cursor);
            let rest = &self.source[cursor..];

            if rest.is_empty() {
                self.error(
                    ParseErrorKind::UnclosedTag {
                        tag_name: name.to_string(),
                    },
                    tag_start,
                );
                return None;
            }
            if rest.starts_with("/>") {
                // `<template src="./t.html" />` has no content
                block.start = cursor + 2;
                block.end = cursor + 2;
                self.insert_block(block, tag_start);
                return Some(cursor + 2);
            }
            if rest.starts_with('>') {
                break cursor + 1;
            }

            let attr_len = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
                .unwrap_or(rest.len());
            if attr_len == 0 {
                cursor += 1;
                continue;
            }
            let attr_name = &rest[..attr_len];
            cursor = self.skip_whitespace(cursor + attr_len);

            if !self.source[cursor..].starts_with('=') {
                block.set_attr(attr_name, AttrValue::Flag);
                continue;
            }

            cursor = self.skip_whitespace(cursor + 1);
            let rest = &self.source[cursor..];
            let value = match rest.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let Some(len) = rest[1..].find(quote) else {
                        self.error(
                            ParseErrorKind::UnclosedTag {
                                tag_name: name.to_string(),
                            },
                            tag_start,
                        );
                        return None;
                    };
                    cursor += len + 2;
                    &rest[1..1 + len]
                }
                _ => {
                    let len = rest
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(rest.len());
                    cursor += len;
                    &rest[..len]
                }
            };
            block.set_attr(attr_name, AttrValue::Value(value.to_string()));
        };

        let Some((close_start, after_close)) = self.find_closing_tag(name, content_start) else {
            self.error(
                ParseErrorKind::UnclosedBlock {
                    block_type: name.to_string(),
                },
                tag_start,
            );
            return None;
        };

        block.content = self.source[content_start..close_start].to_string();
        block.start = content_start;
        block.end = close_start;
        self.insert_block(block, tag_start);
        Some(after_close)
    }

    /// Finds `</name ...>` for a block whose content starts at `from`.
    fn find_closing_tag(&self, name: &str, from: usize) -> Option<(usize, usize)> {
        let open = format!("<{name}");
        let close = format!("</{name}");
        let balance_nested = name == "template";
        let mut depth = 0usize;
        let mut cursor = from;

        loop {
            let rest = &self.source[cursor..];
            let close_at = find_tag(rest, &close)?;

            if balance_nested {
                if let Some(open_at) = find_tag(rest, &open).filter(|&at| at < close_at) {
                    let tag_len = rest[open_at..].find('>')?;
                    if !rest[open_at..open_at + tag_len].ends_with('/') {
                        depth += 1;
                    }
                    cursor += open_at + tag_len + 1;
                    continue;
                }
            }

            let close_start = cursor + close_at;
            let after_close = close_start + self.source[close_start..].find('>')? + 1;
            if depth == 0 {
                return Some((close_start, after_close));
            }
            depth -= 1;
            cursor = after_close;
        }
    }

    fn insert_block(&mut self, block: SfcBlock, tag_start: usize) {
        trace!(
            block_type = %block.block_type,
            start = block.start,
            end = block.end,
            "found sfc block"
        );

        let slot = match block.block_type.as_str() {
            "template" => &mut self.descriptor.template,
            "script" => &mut self.descriptor.script,
            "style" => {
                self.descriptor.styles.push(block);
                return;
            }
            _ => {
                self.descriptor.custom_blocks.push(block);
                return;
            }
        };

        if slot.is_none() {
            *slot = Some(block);
            return;
        }

        let block_type = block.block_type.to_string();
        self.error(ParseErrorKind::DuplicateBlock { block_type }, tag_start);
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let rest = &self.source[from..];
        from + (rest.len() - rest.trim_start().len())
    }

    fn error(&mut self, kind: ParseErrorKind, start: usize) {
        self.errors.push(ParseError::new(
            kind,
            Span::from_offsets(start, self.source.len()),
        ));
    }
}

fn is_tag_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Finds `pattern` where it is not just the prefix of a longer tag name.
fn find_tag(haystack: &str, pattern: &str) -> Option<usize> {
    haystack.match_indices(pattern).map(|(at, _)| at).find(|&at| {
        haystack[at + pattern.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_tag_name_char(c))
    })
}
