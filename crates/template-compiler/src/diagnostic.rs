//! Diagnostics forwarded from the template compiler.

use serde::Serialize;
use std::fmt;

/// The severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A compiler tip.
    Warning,
    /// A compiler error.
    Error,
}

impl Severity {
    /// Returns the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A single diagnostic for the host build tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The file the diagnostic belongs to.
    pub id: String,
    /// The compiler's message.
    pub message: String,
    /// A code frame pointing at the offending range, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// Tip or error.
    pub severity: Severity,
}

impl Diagnostic {
    /// Creates a diagnostic without a frame.
    pub fn new(id: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            frame: None,
            severity,
        }
    }

    /// Attaches a code frame.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    /// Returns true for errors.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.message)?;
        if let Some(frame) = &self.frame {
            write!(f, "\n{frame}")?;
        }
        Ok(())
    }
}

/// Receives diagnostics as they are produced.
///
/// Reporting never stops compilation; the caller decides afterwards whether
/// the reported errors should fail the build.
pub trait DiagnosticSink {
    /// Reports one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// A sink that only logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(id = %diagnostic.id, "{}", diagnostic.message),
            Severity::Error => tracing::error!(id = %diagnostic.id, "{}", diagnostic.message),
        }
    }
}
