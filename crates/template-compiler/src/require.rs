//! Rewrites `require("...")` calls in render code into static imports.
//!
//! The template compiler turns asset URLs into `require()` calls, which an
//! ES module bundle cannot contain. Each distinct literal becomes one
//! `import` at the top of the module and every call site is replaced by the
//! imported binding.
//!
//! Only `require(` immediately followed by a single non-empty string literal
//! and `)` is recognized. This matches what the compiler emits; other call
//! shapes are left alone. The scanner skips strings, template literals,
//! comments and regex literals.

use indexmap::IndexMap;
use tracing::trace;

const REQUIRE_CALL: &str = "require(";

/// Scanner state for tracking context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanContext {
    Code,
    SingleQuoteString,
    DoubleQuoteString,
    TemplateLiteral,
    LineComment,
    BlockComment,
    Regex { in_class: bool },
}

/// Keywords after which a `/` starts a regex rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "yield", "await",
];

/// Replaces `require("x")` calls with imported bindings.
///
/// Returns the input unchanged when it contains no such call.
pub fn transform_require_to_import(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut imports: IndexMap<&str, String> = IndexMap::new();
    let mut body = String::with_capacity(code.len());
    let mut copied = 0;

    let mut context = ScanContext::Code;
    // Brace depth inside each open `${` of a template literal
    let mut template_braces: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match context {
            ScanContext::Code => match b {
                b'\'' => context = ScanContext::SingleQuoteString,
                b'"' => context = ScanContext::DoubleQuoteString,
                b'`' => context = ScanContext::TemplateLiteral,
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    context = ScanContext::LineComment;
                    i += 1;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    context = ScanContext::BlockComment;
                    i += 1;
                }
                b'/' if regex_allowed(bytes, i) => {
                    context = ScanContext::Regex { in_class: false };
                }
                b'{' => {
                    if let Some(depth) = template_braces.last_mut() {
                        *depth += 1;
                    }
                }
                b'}' => match template_braces.last_mut() {
                    Some(0) => {
                        template_braces.pop();
                        context = ScanContext::TemplateLiteral;
                    }
                    Some(depth) => *depth -= 1,
                    None => {}
                },
                b'r' if starts_identifier(bytes, i) => {
                    if let Some((literal, call_end)) = match_require_call(code, i) {
                        let ident = imports
                            .entry(literal)
                            .or_insert_with(|| import_identifier(literal));
                        trace!(literal, ident = %ident, "rewriting require");

                        body.push_str(&code[copied..i]);
                        body.push_str(ident);
                        copied = call_end;
                        i = call_end;
                        continue;
                    }
                }
                _ => {}
            },
            ScanContext::SingleQuoteString | ScanContext::DoubleQuoteString => {
                let quote = if context == ScanContext::SingleQuoteString {
                    b'\''
                } else {
                    b'"'
                };
                if b == b'\\' {
                    i += 1;
                } else if b == quote {
                    context = ScanContext::Code;
                }
            }
            ScanContext::TemplateLiteral => match b {
                b'\\' => i += 1,
                b'`' => context = ScanContext::Code,
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    template_braces.push(0);
                    context = ScanContext::Code;
                    i += 1;
                }
                _ => {}
            },
            ScanContext::LineComment => {
                if b == b'\n' {
                    context = ScanContext::Code;
                }
            }
            ScanContext::BlockComment => {
                if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    context = ScanContext::Code;
                    i += 1;
                }
            }
            ScanContext::Regex { in_class } => match b {
                b'\\' => i += 1,
                b'[' => context = ScanContext::Regex { in_class: true },
                b']' => context = ScanContext::Regex { in_class: false },
                b'/' if !in_class => context = ScanContext::Code,
                // Unterminated
                b'\n' => context = ScanContext::Code,
                _ => {}
            },
        }
        i += 1;
    }

    if imports.is_empty() {
        return code.to_string();
    }
    body.push_str(&code[copied..]);

    let mut out = String::with_capacity(body.len() + imports.len() * 48);
    for (literal, ident) in &imports {
        out.push_str("import ");
        out.push_str(ident);
        out.push_str(" from ");
        out.push_str(literal);
        out.push('\n');
    }
    out.push_str(&body);
    out
}

/// True when a `/` at `pos` opens a regex literal: it follows an operator,
/// an opening or closing brace, a keyword, or nothing at all.
fn regex_allowed(bytes: &[u8], pos: usize) -> bool {
    let Some(last) = bytes[..pos].iter().rposition(|b| !b.is_ascii_whitespace()) else {
        return true;
    };
    let before = &bytes[..=last];
    let prev = bytes[last];

    if is_identifier_byte(prev) {
        let start = before
            .iter()
            .rposition(|&b| !is_identifier_byte(b))
            .map_or(0, |p| p + 1);
        let word = &before[start..];
        return REGEX_KEYWORDS.iter().any(|k| k.as_bytes() == word);
    }

    matches!(
        prev,
        b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
            | b'+' | b'-' | b'*' | b'%' | b'<' | b'>' | b'~' | b'^'
    )
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$')
}

/// True when the byte at `pos` does not continue an identifier or member access.
fn starts_identifier(bytes: &[u8], pos: usize) -> bool {
    match pos.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(prev) => !(is_identifier_byte(prev) || prev == b'.'),
    }
}

/// Matches `require("literal")` at `pos`, returning the raw literal (quotes
/// included) and the offset just past the closing parenthesis.
fn match_require_call(code: &str, pos: usize) -> Option<(&str, usize)> {
    let rest = code[pos..].strip_prefix(REQUIRE_CALL)?;
    let literal_start = pos + REQUIRE_CALL.len();
    let bytes = rest.as_bytes();

    let quote = *bytes.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => break,
            _ => i += 1,
        }
    }
    // Unterminated, or an empty literal
    if i >= bytes.len() || i == 1 {
        return None;
    }

    if bytes.get(i + 1) != Some(&b')') {
        return None;
    }

    let literal_end = literal_start + i + 1;
    Some((&code[literal_start..literal_end], literal_end + 1))
}

/// Builds the binding name for a raw literal: every character outside
/// `[a-z0-9]` becomes `_`, runs of `_` collapse, and one leading and one
/// trailing `_` are trimmed.
fn import_identifier(literal: &str) -> String {
    let mut body = String::with_capacity(literal.len());
    for c in literal.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && body.ends_with('_') {
            continue;
        }
        body.push(c);
    }

    let body = body.strip_prefix('_').unwrap_or(&body);
    let body = body.strip_suffix('_').unwrap_or(body);
    format!("__$_require_{body}__")
}
