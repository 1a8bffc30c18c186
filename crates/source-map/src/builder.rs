//! Source map generation for compiled template blocks.

use crate::{RawSourceMap, SourceMapError};
use sourcemap::SourceMapBuilder;
use tracing::trace;

/// A position in a source map: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 0-indexed column, in UTF-16 code units.
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A single mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The position in the generated output.
    pub generated: Position,
    /// The position in the original source.
    pub original: Position,
    /// Index into the map's `sources`.
    pub source: u32,
}

/// Builds the source map for a compiled block.
///
/// Every non-blank line of `generated` maps column-for-column onto the line
/// `line_offset` lines further down in `source`. A line counts as blank when
/// it holds only whitespace, optionally after a leading `//`.
///
/// `filename` is recorded in `sources` exactly as given. `file` and
/// `sourceRoot` have their backslashes turned into forward slashes, and an
/// empty root is kept.
pub fn generate_source_map(
    filename: &str,
    source: &str,
    generated: &str,
    source_root: &str,
    line_offset: u32,
) -> Result<RawSourceMap, SourceMapError> {
    let file = normalize_separators(filename);
    let mut builder = SourceMapBuilder::new(Some(file.as_str()));
    // Registered on the first mapping, so a map without mappings lists no source
    let mut source_id = None;
    let mut count = 0usize;

    for (index, line) in split_lines(generated).enumerate() {
        if is_empty_line(line) {
            continue;
        }

        let generated_line = index as u32;
        let original_line = generated_line + line_offset;
        let mut column = 0u32;
        for ch in line.chars() {
            if !is_js_whitespace(ch) {
                let id = *source_id.get_or_insert_with(|| {
                    let id = builder.add_source(filename);
                    builder.set_source_contents(id, Some(source));
                    id
                });
                builder.add_raw(
                    generated_line,
                    column,
                    original_line,
                    column,
                    Some(id),
                    None,
                    false,
                );
                count += 1;
            }
            column += ch.len_utf16() as u32;
        }
    }

    let mut json = Vec::new();
    builder.into_sourcemap().to_writer(&mut json)?;
    let mut map: RawSourceMap = serde_json::from_slice(&json)?;
    map.source_root = Some(normalize_separators(source_root));
    map.sources_content.get_or_insert_with(Vec::new);

    trace!(filename, mappings = count, "generated source map");
    Ok(map)
}

/// Splits text on `\n`, dropping a `\r` that precedes it.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn is_empty_line(line: &str) -> bool {
    line.strip_prefix("//")
        .unwrap_or(line)
        .chars()
        .all(is_js_whitespace)
}

/// The characters matched by `\s` in a JavaScript regular expression.
fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_lines() {
        assert!(is_empty_line(""));
        assert!(is_empty_line("   \t"));
        assert!(is_empty_line("//"));
        assert!(is_empty_line("//   "));
        assert!(is_empty_line("\u{FEFF}"));
        assert!(!is_empty_line("// license"));
        assert!(!is_empty_line("  //"));
        assert!(!is_empty_line("x"));
        assert!(!is_empty_line("\u{0085}"));
    }

    #[test]
    fn test_js_whitespace() {
        for c in ['\u{000B}', '\u{00A0}', '\u{2005}', '\u{3000}', '\u{FEFF}'] {
            assert!(is_js_whitespace(c), "{c:?}");
        }
        for c in ['\u{0085}', '\u{200B}', 'a'] {
            assert!(!is_js_whitespace(c), "{c:?}");
        }
    }

    #[test]
    fn test_split_lines_handles_crlf() {
        let lines: Vec<_> = split_lines("a\r\nb\nc").collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_file_and_root_are_normalized() {
        let map = generate_source_map(r"src\App.vue", "", "x", r"C:\project", 0).unwrap();
        assert_eq!(map.file.as_deref(), Some("src/App.vue"));
        assert_eq!(map.source_root.as_deref(), Some("C:/project"));
        assert_eq!(map.sources, vec![r"src\App.vue".to_string()]);
    }

    #[test]
    fn test_sources_keep_the_filename() {
        let map =
            generate_source_map("/project/src/App.vue", "<p/>", "<p/>", "/project", 0).unwrap();
        assert_eq!(map.sources, vec!["/project/src/App.vue".to_string()]);
        assert_eq!(map.source_root.as_deref(), Some("/project"));
        assert_eq!(map.sources_content, Some(vec![Some("<p/>".to_string())]));
    }

    #[test]
    fn test_empty_root_is_kept() {
        let map = generate_source_map("App.vue", "", "x", "", 0).unwrap();
        assert_eq!(map.source_root.as_deref(), Some(""));
    }

    #[test]
    fn test_generate_identity_map() {
        let map = generate_source_map("App.vue", "<div/>", "<div/>", "", 0).unwrap();
        assert_eq!(map.sources, vec!["App.vue".to_string()]);
        assert_eq!(map.mappings, "AAAA,CAAC,CAAC,CAAC,CAAC,CAAC");
        assert_eq!(
            map.sources_content,
            Some(vec![Some("<div/>".to_string())])
        );
    }

    #[test]
    fn test_generate_skips_blank_and_comment_lines() {
        let map = generate_source_map("App.vue", "", "//\n\n  \r\n", "", 0).unwrap();
        assert!(map.mappings.chars().all(|c| c == ';'));
        assert!(map.decoded_mappings().unwrap().is_empty());
        assert!(map.sources.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_not_mapped() {
        let map = generate_source_map("App.vue", "", "\u{FEFF}", "", 0).unwrap();
        assert!(map.decoded_mappings().unwrap().is_empty());
        assert_eq!(map.sources_content, Some(Vec::new()));
    }

    #[test]
    fn test_generate_shifts_lines() {
        let map = generate_source_map("App.vue", "", "a\n b", "", 3).unwrap();
        let mappings = map.decoded_mappings().unwrap();
        assert_eq!(
            mappings
                .iter()
                .map(|m| (m.generated, m.original))
                .collect::<Vec<_>>(),
            vec![
                (Position::new(1, 0), Position::new(4, 0)),
                (Position::new(2, 1), Position::new(5, 1)),
            ]
        );
    }

    #[test]
    fn test_generate_counts_utf16_columns() {
        let map = generate_source_map("App.vue", "", "😀x", "", 0).unwrap();
        let columns: Vec<_> = map
            .decoded_mappings()
            .unwrap()
            .iter()
            .map(|m| m.generated.column)
            .collect();
        assert_eq!(columns, vec![0, 2]);
    }
}
