//! Compilation glue for Vue 2 single-file component template blocks.
//!
//! This crate sits between a parsed `.vue` file and an external template
//! compiler. It:
//! - Builds the compiler options from fixed defaults and user overrides
//! - Forwards the compiler's tips and errors to a [`DiagnosticSink`]
//! - Rewrites `require("...")` calls in the render code into static imports
//! - Generates a line-offset source map for the block
//!
//! # Example
//!
//! ```
//! use template_compiler::{
//!     compile_sfc_template, BoxError, CompileOutput, CompileRequest, Diagnostic,
//!     TemplateCompiler, TemplateOptions,
//! };
//!
//! struct Echo;
//!
//! impl TemplateCompiler for Echo {
//!     fn compile(&self, _request: &CompileRequest) -> Result<CompileOutput, BoxError> {
//!         Ok(CompileOutput {
//!             code: r#"var render = function () { return _c('img', {attrs: {src: require("./a.png")}}) }"#.into(),
//!             ..CompileOutput::default()
//!         })
//!     }
//! }
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let output = compile_sfc_template(
//!     "<img src=\"./a.png\">",
//!     None,
//!     "App.vue",
//!     &TemplateOptions::new("/project"),
//!     &Echo,
//!     &mut diagnostics,
//! )
//! .unwrap();
//!
//! assert!(output.code.starts_with("import __$_require_a_png__ from \"./a.png\"\n"));
//! assert!(output.code.ends_with("\nexport { render, staticRenderFns }"));
//! assert!(diagnostics.is_empty());
//! ```

mod code_frame;
mod compiler;
mod diagnostic;
mod error;
mod options;
mod require;
mod template;

pub use code_frame::generate_code_frame;
pub use compiler::{CompileOutput, CompileRequest, CompilerMessage, TemplateCompiler};
pub use diagnostic::{Diagnostic, DiagnosticSink, LogSink, Severity};
pub use error::{BoxError, TemplateError};
pub use options::TemplateOptions;
pub use require::transform_require_to_import;
pub use template::{
    block_content, compile_sfc_template, template_line_offset, TemplateOutput, RENDER_EXPORT,
};
