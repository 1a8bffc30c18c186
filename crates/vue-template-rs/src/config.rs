//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use template_compiler::TemplateOptions;
use thiserror::Error;
use tracing::debug;

/// The config file looked up in the workspace when `--config` is not given.
pub const CONFIG_FILE: &str = "vue-template.config.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON, or has the wrong shape.
    #[error("invalid config {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },
}

/// Project configuration from `vue-template.config.json`.
///
/// Comments are allowed. Every key is optional:
///
/// ```json
/// {
///   // defaults to the workspace
///   "root": ".",
///   "isProduction": false,
///   "vueTemplateOptions": { "compilerOptions": { "whitespace": "preserve" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    /// Source map root, relative to the workspace.
    pub root: Option<Utf8PathBuf>,
    /// Production build.
    pub is_production: Option<bool>,
    /// Options passed through to the template compiler.
    pub vue_template_options: Map<String, Value>,
}

impl ProjectConfig {
    /// Loads the config from `explicit`, or from the workspace's config file
    /// if one exists.
    pub fn load(workspace: &Utf8Path, explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => workspace.join(path),
            None => {
                let path = workspace.join(CONFIG_FILE);
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        debug!(%path, "loading config");
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|message| ConfigError::Parse { path, message })
    }

    fn parse(content: &str) -> Result<Self, String> {
        serde_json::from_str(&remove_json_comments(content)).map_err(|e| e.to_string())
    }

    /// Resolves the template options, letting `--production` win over the file.
    pub fn template_options(self, workspace: &Utf8Path, production: bool) -> TemplateOptions {
        let root = match self.root {
            Some(root) => workspace.join(root),
            None => workspace.to_path_buf(),
        };

        TemplateOptions {
            root: root.into_string(),
            is_production: production || self.is_production.unwrap_or(false),
            vue_template_options: self.vue_template_options,
        }
    }
}

/// Strips `//` and `/* */` comments outside of string literals.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                '"' => in_string = false,
                '\\' => result.extend(chars.next()),
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|&next| next != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                while let Some(next) = chars.next() {
                    if next == '*' && chars.next_if_eq(&'/').is_some() {
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
    }

    result
}
