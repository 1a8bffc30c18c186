//! The worker script executed by node.

use crate::NodeError;
use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

const SCRIPT_FILENAME: &str = "vue-template-compiler-worker.cjs";

pub(crate) const SCRIPT_SOURCE: &str = r#"'use strict';
const { createInterface } = require('node:readline');
const { createRequire } = require('node:module');
const path = require('node:path');

let compileTemplate = null;
let compiler = null;
try {
  const requireFromCwd = createRequire(path.join(process.cwd(), 'noop.js'));
  compileTemplate = requireFromCwd('@vue/component-compiler-utils').compileTemplate;
  compiler = requireFromCwd('vue-template-compiler');
} catch (err) {
  const message = err && err.message ? err.message : String(err);
  console.error(`vue-template-rs worker failed to load the template compiler: ${message}`);
  process.exit(2);
}

const send = (value) => process.stdout.write(JSON.stringify(value) + '\n');

send({ ready: true });

const rl = createInterface({ input: process.stdin, crlfDelay: Infinity });

rl.on('line', (line) => {
  if (!line.trim()) return;

  let req;
  try {
    req = JSON.parse(line);
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    send({ id: null, error: `invalid json: ${message}` });
    return;
  }

  const id = req.id;
  try {
    const result = compileTemplate({
      ...(req.options || {}),
      source: req.source,
      filename: req.filename,
      compiler,
    });
    send({
      id,
      code: result.code,
      tips: result.tips || [],
      errors: result.errors || [],
    });
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    send({ id, error: message });
  }
});
"#;

/// Writes the worker script into the cache directory, returning its path.
pub(crate) fn ensure_script() -> Result<Utf8PathBuf, NodeError> {
    let cache_dir = crate::NodeRunner::get_cache_dir()
        .ok_or_else(|| NodeError::InstallFailed("could not determine cache directory".into()))?;
    ensure_script_in(&cache_dir)
}

/// Writes the worker script into `dir` unless an identical copy is there.
pub(crate) fn ensure_script_in(dir: &Utf8Path) -> Result<Utf8PathBuf, NodeError> {
    fs::create_dir_all(dir)
        .map_err(|e| NodeError::InstallFailed(format!("failed to create cache dir: {e}")))?;

    let script_path = dir.join(SCRIPT_FILENAME);
    let expected_hash = blake3::hash(SCRIPT_SOURCE.as_bytes());

    if let Ok(existing) = fs::read(&script_path) {
        let mut hasher = Hasher::new();
        hasher.update(&existing);
        if hasher.finalize() == expected_hash {
            return Ok(script_path);
        }
    }

    debug!(path = %script_path, "writing worker script");
    fs::write(&script_path, SCRIPT_SOURCE)
        .map_err(|e| NodeError::InstallFailed(format!("failed to write worker script: {e}")))?;

    Ok(script_path)
}
