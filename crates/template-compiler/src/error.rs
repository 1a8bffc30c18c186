//! Template compilation error types.

use camino::Utf8PathBuf;
use source_map::SourceMapError;
use thiserror::Error;

/// Boxed error returned by a [`TemplateCompiler`](crate::TemplateCompiler) backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A fatal error while compiling a template block.
///
/// Diagnostics reported by the compiler are not errors; they go to the
/// [`DiagnosticSink`](crate::DiagnosticSink).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The external `src` of a block could not be read.
    #[error("failed to read template source {path}: {source}")]
    ReadSource {
        /// The resolved path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The compiler backend itself failed to run.
    #[error("template compiler failed: {0}")]
    Compiler(#[source] BoxError),

    /// The source map could not be built.
    #[error(transparent)]
    SourceMap(#[from] SourceMapError),
}
