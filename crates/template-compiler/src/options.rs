//! Options for template compilation.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use sfc_parser::SfcBlock;

/// Resolved options for compiling template blocks.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateOptions {
    /// Project root, used as the source map's `sourceRoot`.
    pub root: String,
    /// Production build (no dev-only helpers in the render code).
    pub is_production: bool,
    /// Free-form options passed through to the compiler.
    ///
    /// Keys here override the fixed defaults. A nested `compilerOptions`
    /// object is shallow-merged over `{ whitespace: "condense" }`.
    pub vue_template_options: Map<String, Value>,
}

impl TemplateOptions {
    /// Creates options for the given project root.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the production flag.
    pub fn with_production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self
    }

    /// Sets a pass-through compiler option.
    pub fn with_template_option(mut self, name: &str, value: Value) -> Self {
        self.vue_template_options.insert(name.to_string(), value);
        self
    }

    /// Builds the option object sent to the compiler for `block`.
    pub fn compiler_request_options(&self, block: Option<&SfcBlock>) -> Map<String, Value> {
        let mut options = Map::new();
        options.insert("transformAssetUrls".into(), Value::Bool(true));
        options.insert(
            "transformAssetUrlsOptions".into(),
            json!({ "forceRequire": true }),
        );
        options.insert("isProduction".into(), Value::Bool(self.is_production));
        options.insert(
            "isFunctional".into(),
            Value::Bool(block.is_some_and(SfcBlock::is_functional)),
        );
        options.insert("optimizeSSR".into(), Value::Bool(false));
        options.insert("prettify".into(), Value::Bool(false));
        if let Some(lang) = block.and_then(|b| b.lang.as_deref()) {
            options.insert("preprocessLang".into(), Value::String(lang.to_string()));
        }

        for (key, value) in &self.vue_template_options {
            options.insert(key.clone(), value.clone());
        }

        let mut compiler_options = Map::new();
        compiler_options.insert("whitespace".into(), Value::String("condense".into()));
        if let Some(Value::Object(user)) = self.vue_template_options.get("compilerOptions") {
            for (key, value) in user {
                compiler_options.insert(key.clone(), value.clone());
            }
        }
        options.insert("compilerOptions".into(), Value::Object(compiler_options));

        options
    }
}
