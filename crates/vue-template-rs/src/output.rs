//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8PathBuf;
use serde::Serialize;
use sfc_parser::ParseError;
use source_map::{LineCol, LineIndex};
use template_compiler::{Diagnostic, Severity};

/// Everything reported for one component.
#[derive(Debug, Default)]
pub struct FileReport {
    /// Path shown to the user, relative to the workspace when possible.
    pub path: Utf8PathBuf,
    /// The component source, for positions of block-level errors.
    pub source: String,
    /// Problems locating the component's blocks.
    pub parse_errors: Vec<ParseError>,
    /// Tips and errors from the template compiler.
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.parse_errors.is_empty() && self.diagnostics.is_empty()
    }

    /// Number of errors, counting every block-level problem as one.
    pub fn error_count(&self) -> usize {
        self.parse_errors.len() + self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_error()).count()
    }
}

/// A formatted diagnostic for output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// Error or Warning.
    #[serde(rename = "type")]
    pub diagnostic_type: &'static str,
    /// The file path.
    pub filename: String,
    /// Where a block-level error starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Position>,
    /// The message.
    pub message: String,
    /// The compiler's code frame, if the message had a range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// `sfc` for block-level errors, `template` for compiler messages.
    pub source: &'static str,
}

/// A position in the source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the diagnostics of one component.
    pub fn format(&self, report: &FileReport) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Human => Ok(Self::format_human(report)),
            OutputFormat::Json => {
                serde_json::to_string_pretty(&Self::format_json_diagnostics(report))
            }
        }
    }

    fn format_human(report: &FileReport) -> String {
        let mut output = String::new();

        for diag in Self::format_json_diagnostics(report) {
            output.push_str(&diag.filename);
            if let Some(start) = &diag.start {
                output.push_str(&format!(":{}:{}", start.line, start.column));
            }
            output.push_str(&format!(
                "\n{}: {} ({})\n",
                diag.diagnostic_type, diag.message, diag.source
            ));
            if let Some(frame) = &diag.frame {
                output.push_str(frame);
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    /// Formats diagnostics into JSON-ready structs, block-level errors first.
    pub fn format_json_diagnostics(report: &FileReport) -> Vec<FormattedDiagnostic> {
        let filename = report.path.to_string();
        let mut formatted = Vec::with_capacity(report.parse_errors.len() + report.diagnostics.len());

        if !report.parse_errors.is_empty() {
            let line_index = LineIndex::new(&report.source);
            formatted.extend(report.parse_errors.iter().map(|error| {
                let start = line_index
                    .line_col(error.span.start)
                    .unwrap_or(LineCol::new(0, 0));
                FormattedDiagnostic {
                    diagnostic_type: "Error",
                    filename: filename.clone(),
                    start: Some(Position {
                        line: start.line + 1,
                        column: start.col + 1,
                        offset: u32::from(error.span.start),
                    }),
                    message: error.to_string(),
                    frame: None,
                    source: "sfc",
                }
            }));
        }

        formatted.extend(report.diagnostics.iter().map(|diag| FormattedDiagnostic {
            diagnostic_type: match diag.severity {
                Severity::Error => "Error",
                Severity::Warning => "Warning",
            },
            filename: filename.clone(),
            start: None,
            message: diag.message.clone(),
            frame: diag.frame.clone(),
            source: "template",
        }));

        formatted
    }
}

/// Summary of a compile run.
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Number of components found.
    pub file_count: usize,
    /// Number of templates compiled.
    pub compiled_count: usize,
    /// Number of errors.
    pub error_count: usize,
    /// Number of warnings.
    pub warning_count: usize,
    /// Whether to fail on warnings.
    pub fail_on_warnings: bool,
}

impl BuildSummary {
    /// Returns true if the run should exit with an error.
    pub fn failed(&self) -> bool {
        self.error_count > 0 || (self.fail_on_warnings && self.warning_count > 0)
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        format!(
            "====================================\nvue-template-rs compiled {} of {} and found {} and {}",
            self.compiled_count,
            plural(self.file_count, "component"),
            plural(self.error_count, "error"),
            plural(self.warning_count, "warning"),
        )
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sfc_parser::{ParseErrorKind, Span};

    fn report() -> FileReport {
        FileReport {
            path: "src/App.vue".into(),
            source: "<script>\n</script>\n<template>\n".into(),
            parse_errors: vec![ParseError::new(
                ParseErrorKind::UnclosedBlock {
                    block_type: "template".into(),
                },
                Span::new(19u32, 29u32),
            )],
            diagnostics: vec![
                Diagnostic::new("/project/src/App.vue", "tip", Severity::Warning),
                Diagnostic::new("/project/src/App.vue", "bad", Severity::Error)
                    .with_frame("1  |  <div>\n   |  ^^^^^"),
            ],
        }
    }

    #[test]
    fn test_format_human() {
        let output = Formatter::new(OutputFormat::Human).format(&report()).unwrap();
        assert!(output.ends_with("^^^^^\n\n"));
        insta::assert_snapshot!(output, @r"
        src/App.vue:3:1
        Error: unclosed block: <template> (sfc)

        src/App.vue
        Warning: tip (template)

        src/App.vue
        Error: bad (template)
        1  |  <div>
           |  ^^^^^
        ");
    }

    #[test]
    fn test_format_json() {
        let output = Formatter::new(OutputFormat::Json).format(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["type"], "Error");
        assert_eq!(value[0]["start"]["line"], 3);
        assert_eq!(value[0]["start"]["offset"], 19);
        assert_eq!(value[0]["source"], "sfc");
        assert_eq!(value[1]["type"], "Warning");
        assert!(value[1].get("frame").is_none());
        assert_eq!(value[2]["frame"], "1  |  <div>\n   |  ^^^^^");
        assert_eq!(value[2]["filename"], "src/App.vue");
    }

    #[test]
    fn test_report_counts() {
        let report = report();
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.is_empty());
        assert!(FileReport::default().is_empty());
    }

    #[test]
    fn test_summary() {
        let summary = BuildSummary {
            file_count: 5,
            compiled_count: 4,
            error_count: 1,
            warning_count: 3,
            fail_on_warnings: false,
        };

        let output = summary.format();
        assert!(output.contains("compiled 4 of 5 components"));
        assert!(output.contains("1 error and 3 warnings"));
        assert!(summary.failed());
    }

    #[test]
    fn test_fail_on_warnings() {
        let mut summary = BuildSummary {
            warning_count: 1,
            ..BuildSummary::default()
        };
        assert!(!summary.failed());
        summary.fail_on_warnings = true;
        assert!(summary.failed());
    }
}
