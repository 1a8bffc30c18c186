//! The contract with the external template compiler.

use crate::code_frame::generate_code_frame;
use crate::BoxError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Input for one template compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileRequest {
    /// The template source.
    pub source: String,
    /// The component's file name.
    pub filename: String,
    /// Options for the compiler, already merged with the fixed defaults.
    pub options: Map<String, Value>,
}

impl CompileRequest {
    /// Returns an option by its (camelCase) name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Returns a nested `compilerOptions` entry.
    pub fn compiler_option(&self, name: &str) -> Option<&Value> {
        self.options
            .get("compilerOptions")
            .and_then(Value::as_object)
            .and_then(|options| options.get(name))
    }
}

/// A tip or error from the compiler.
///
/// Older compilers report bare strings; with `outputSourceRange` enabled they
/// report objects carrying the range of the offending template text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawCompilerMessage")]
pub enum CompilerMessage {
    /// A message without position.
    Plain(String),
    /// A message with a `[start, end)` range into the template source.
    Ranged {
        /// The message text.
        message: String,
        /// Range start, in UTF-16 code units.
        start: usize,
        /// Range end, in UTF-16 code units.
        end: usize,
    },
}

impl CompilerMessage {
    /// Returns the message text.
    pub fn message(&self) -> &str {
        match self {
            CompilerMessage::Plain(message) => message,
            CompilerMessage::Ranged { message, .. } => message,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCompilerMessage {
    Text(String),
    Object {
        msg: String,
        start: Option<usize>,
        end: Option<usize>,
    },
}

impl From<RawCompilerMessage> for CompilerMessage {
    fn from(raw: RawCompilerMessage) -> Self {
        match raw {
            RawCompilerMessage::Text(message) => CompilerMessage::Plain(message),
            RawCompilerMessage::Object {
                msg,
                start: Some(start),
                end: Some(end),
            } => CompilerMessage::Ranged {
                message: msg,
                start,
                end,
            },
            RawCompilerMessage::Object { msg, .. } => CompilerMessage::Plain(msg),
        }
    }
}

/// What the compiler returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompileOutput {
    /// Generated render code, defining `render` and `staticRenderFns`.
    pub code: String,
    /// Non-fatal tips.
    #[serde(default)]
    pub tips: Vec<CompilerMessage>,
    /// Compilation errors.
    #[serde(default)]
    pub errors: Vec<CompilerMessage>,
}

/// A template-to-render-function compiler backend.
pub trait TemplateCompiler {
    /// Compiles one template.
    ///
    /// Problems in the template come back in [`CompileOutput::errors`]; an
    /// `Err` means the backend itself could not run.
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, BoxError>;

    /// Renders a code frame for a ranged message.
    ///
    /// Backends with their own frame renderer can override this; the default
    /// uses the built-in one, which follows the same format.
    fn code_frame(&self, source: &str, start: usize, end: usize) -> String {
        generate_code_frame(source, start, end)
    }
}

impl<T: TemplateCompiler + ?Sized> TemplateCompiler for &T {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, BoxError> {
        (**self).compile(request)
    }

    fn code_frame(&self, source: &str, start: usize, end: usize) -> String {
        (**self).code_frame(source, start, end)
    }
}
