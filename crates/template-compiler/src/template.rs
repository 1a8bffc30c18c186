//! Template block compilation.

use crate::compiler::{CompileRequest, CompilerMessage, TemplateCompiler};
use crate::diagnostic::{Diagnostic, DiagnosticSink, Severity};
use crate::options::TemplateOptions;
use crate::require::transform_require_to_import;
use crate::TemplateError;
use camino::{Utf8Path, Utf8PathBuf};
use sfc_parser::SfcBlock;
use source_map::{generate_source_map, split_lines, RawSourceMap};
use std::borrow::Cow;
use std::fs;
use tracing::debug;

/// Appended to every compiled template so the component can import it.
pub const RENDER_EXPORT: &str = "\nexport { render, staticRenderFns }";

/// The result of compiling a template block.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOutput {
    /// ES module code exporting `render` and `staticRenderFns`.
    pub code: String,
    /// Source map for the block, present when a block was given.
    pub map: Option<RawSourceMap>,
}

/// Compiles the template `source` of `filename` into an ES module.
///
/// Every tip and error the compiler reports is forwarded to `sink`, and a
/// result is still returned when errors were reported. Fails only when the
/// compiler cannot run, or when the block's external `src` cannot be read.
pub fn compile_sfc_template<C>(
    source: &str,
    block: Option<&SfcBlock>,
    filename: &str,
    options: &TemplateOptions,
    compiler: &C,
    sink: &mut dyn DiagnosticSink,
) -> Result<TemplateOutput, TemplateError>
where
    C: TemplateCompiler + ?Sized,
{
    debug!(filename, production = options.is_production, "compiling template");

    let request = CompileRequest {
        source: source.to_string(),
        filename: filename.to_string(),
        options: options.compiler_request_options(block),
    };
    let output = compiler.compile(&request).map_err(TemplateError::Compiler)?;

    for tip in &output.tips {
        sink.report(Diagnostic::new(filename, tip.message(), Severity::Warning));
    }

    for error in &output.errors {
        let diagnostic = match error {
            CompilerMessage::Plain(message) => {
                Diagnostic::new(filename, message.as_str(), Severity::Error)
            }
            CompilerMessage::Ranged {
                message,
                start,
                end,
            } => Diagnostic::new(filename, message.as_str(), Severity::Error)
                .with_frame(compiler.code_frame(source, *start, *end)),
        };
        sink.report(diagnostic);
    }

    let map = match block {
        Some(block) => {
            let content = block_content(block, filename)?;
            let line_offset = template_line_offset(block);
            Some(generate_source_map(
                filename,
                source,
                &content,
                &options.root,
                line_offset,
            )?)
        }
        None => None,
    };

    let mut code = transform_require_to_import(&output.code);
    code.push_str(RENDER_EXPORT);

    debug!(
        filename,
        tips = output.tips.len(),
        errors = output.errors.len(),
        "compiled template"
    );
    Ok(TemplateOutput { code, map })
}

/// Returns the block's content, reading its external `src` if it has one.
///
/// A relative `src` is resolved against the directory of `filename`.
pub fn block_content<'a>(block: &'a SfcBlock, filename: &str) -> Result<Cow<'a, str>, TemplateError> {
    let Some(src) = block.src.as_deref() else {
        return Ok(Cow::Borrowed(&block.content));
    };

    let path = resolve_src(filename, src);
    debug!(%path, "reading external template");
    fs::read_to_string(&path)
        .map(Cow::Owned)
        .map_err(|source| TemplateError::ReadSource { path, source })
}

fn resolve_src(filename: &str, src: &str) -> Utf8PathBuf {
    let src = Utf8Path::new(src);
    if src.is_absolute() {
        return src.to_path_buf();
    }
    Utf8Path::new(filename)
        .parent()
        .map(|dir| dir.join(src))
        .unwrap_or_else(|| src.to_path_buf())
}

/// The line shift between the block content and the original file.
///
/// Walks the content's lines, consuming `line length + 1` from the block's
/// start offset, and stops at the first line where the remainder goes
/// negative. If the start offset is never exhausted the last line's index is
/// used. Blocks with an external `src` or without content use 0.
///
/// Both the start offset and the line lengths are measured in bytes, the
/// unit [`sfc_parser`] reports block offsets in. Counting UTF-16 units
/// instead would give the same result for ASCII text only.
pub fn template_line_offset(block: &SfcBlock) -> u32 {
    if block.src.is_some() || block.content.is_empty() {
        return 0;
    }

    let mut remaining = block.start as i64;
    let mut offset = 0;
    for (index, line) in split_lines(&block.content).enumerate() {
        offset = index;
        remaining -= line.len() as i64 + 1;
        if remaining < 0 {
            break;
        }
    }
    offset as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc_parser::AttrValue;

    fn block_with_lines(start: usize, widths: &[usize]) -> SfcBlock {
        let content = widths
            .iter()
            .map(|&w| "x".repeat(w))
            .collect::<Vec<_>>()
            .join("\n");
        SfcBlock::new("template", content, start)
    }

    #[test]
    fn test_line_offset_walk_stops_on_negative_remainder() {
        // 120 - 51 = 69, 69 - 61 = 8, 8 - 71 < 0
        let block = block_with_lines(120, &[50, 60, 70]);
        assert_eq!(template_line_offset(&block), 2);

        // 120 - 101 = 19, 19 - 31 < 0
        let block = block_with_lines(120, &[100, 30, 10]);
        assert_eq!(template_line_offset(&block), 1);
    }

    #[test]
    fn test_line_offset_first_line() {
        let block = block_with_lines(10, &[40, 40]);
        assert_eq!(template_line_offset(&block), 0);
    }

    #[test]
    fn test_line_offset_start_past_content_uses_last_line() {
        // "ab\ncd" consumes exactly 6
        let block = block_with_lines(6, &[2, 2]);
        assert_eq!(template_line_offset(&block), 1);
        let block = block_with_lines(500, &[2, 2]);
        assert_eq!(template_line_offset(&block), 1);
    }

    #[test]
    fn test_line_offset_ignores_carriage_returns() {
        let block = SfcBlock::new("template", "ab\r\ncd", 4);
        // 4 - 3 = 1, 1 - 3 < 0
        assert_eq!(template_line_offset(&block), 1);
    }

    #[test]
    fn test_line_offset_counts_bytes() {
        // "éé" is four bytes: 5 - 5 = 0, 0 - 2 < 0
        let block = SfcBlock::new("template", "éé\nx\ny\nz", 5);
        assert_eq!(template_line_offset(&block), 1);
        // Two bytes wide: 5 - 3 = 2, 2 - 2 = 0, 0 - 2 < 0
        let block = SfcBlock::new("template", "ee\nx\ny\nz", 5);
        assert_eq!(template_line_offset(&block), 2);
    }

    #[test]
    fn test_line_offset_zero_for_src_and_empty() {
        let block = block_with_lines(120, &[50, 60, 70])
            .with_attr("src", AttrValue::Value("./t.html".into()));
        assert_eq!(template_line_offset(&block), 0);
        assert_eq!(template_line_offset(&SfcBlock::new("template", "", 120)), 0);
    }

    #[test]
    fn test_resolve_src() {
        assert_eq!(
            resolve_src("/project/src/App.vue", "./App.html"),
            Utf8PathBuf::from("/project/src/./App.html")
        );
        assert_eq!(
            resolve_src("/project/src/App.vue", "/abs/App.html"),
            Utf8PathBuf::from("/abs/App.html")
        );
        assert_eq!(resolve_src("App.vue", "t.html"), Utf8PathBuf::from("t.html"));
    }
}
