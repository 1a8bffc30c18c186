//! node process runner.

use crate::script::ensure_script;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use template_compiler::{BoxError, CompileOutput, CompileRequest, CompilerMessage, TemplateCompiler};
use thiserror::Error;
use tracing::{debug, warn};

/// Error types for the node runner.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Failed to spawn the node process.
    #[error("failed to spawn node: {0}")]
    SpawnFailed(#[from] io::Error),

    /// node exited with an error.
    #[error("node exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// node binary not found.
    #[error("node binary not found at: {0}")]
    NotFound(Utf8PathBuf),

    /// The worker script could not be installed.
    #[error("failed to install worker script: {0}")]
    InstallFailed(String),

    /// The compiler threw while compiling a template.
    #[error("template compiler threw: {0}")]
    CompileFailed(String),

    /// Worker protocol error.
    #[error("node worker protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse a worker response.
    #[error("failed to parse node response: {0}")]
    ParseError(String),
}

#[derive(Debug, Serialize)]
struct NodeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    request: &'a CompileRequest,
}

#[derive(Debug, Deserialize)]
struct NodeResponse {
    id: Option<u64>,
    code: Option<String>,
    #[serde(default)]
    tips: Vec<CompilerMessage>,
    #[serde(default)]
    errors: Vec<CompilerMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeReady {
    ready: bool,
}

/// Compiles templates in a pool of persistent node workers.
///
/// Workers are started on demand. At most `worker_count` idle workers are
/// kept between requests; a worker that fails a request is discarded.
#[derive(Debug)]
pub struct NodeRunner {
    node_path: Utf8PathBuf,
    workspace_root: Utf8PathBuf,
    script_path: Utf8PathBuf,
    worker_count: usize,
    idle: Mutex<Vec<NodeWorker>>,
    next_id: AtomicU64,
}

impl NodeRunner {
    /// Creates a new node runner, installing the worker script if needed.
    pub fn new(
        node_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        worker_count: usize,
    ) -> Result<Self, NodeError> {
        if !node_path.exists() {
            return Err(NodeError::NotFound(node_path));
        }
        let script_path = ensure_script()?;
        Ok(Self::with_script(node_path, workspace_root, script_path, worker_count))
    }

    /// Creates a runner that executes `script_path` instead of the bundled
    /// worker script.
    pub fn with_script(
        node_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        script_path: Utf8PathBuf,
        worker_count: usize,
    ) -> Self {
        Self {
            node_path,
            workspace_root,
            script_path,
            worker_count: worker_count.max(1),
            idle: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Attempts to find node.
    /// 1. Workspace node_modules/.bin/node (if workspace_root provided)
    /// 2. PATH
    pub fn find_node(workspace_root: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        if let Some(workspace) = workspace_root {
            let bin = workspace.join("node_modules/.bin");
            if let Some(path) = find_node_in_bin(&bin) {
                return Some(path);
            }
        }

        which::which("node")
            .ok()
            .and_then(|path| Utf8PathBuf::try_from(path).ok())
    }

    /// Gets the cache directory for vue-template-rs.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("vue-template-rs"))
    }

    /// Gets the version of the node binary this runner uses.
    pub fn node_version(&self) -> Result<String, NodeError> {
        let output = Command::new(&self.node_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(NodeError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NodeError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Compiles one template on an idle worker, starting one if none is free.
    pub fn run(&self, request: &CompileRequest) -> Result<CompileOutput, NodeError> {
        let mut worker = match self.checkout() {
            Some(worker) => worker,
            None => NodeWorker::spawn(&self.node_path, &self.workspace_root, &self.script_path)?,
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match worker.compile(id, request) {
            Ok(output) => {
                self.checkin(worker);
                Ok(output)
            }
            Err(NodeError::CompileFailed(message)) => {
                self.checkin(worker);
                Err(NodeError::CompileFailed(message))
            }
            Err(err) => {
                warn!(filename = %request.filename, error = %err, "discarding node worker");
                Err(err)
            }
        }
    }

    /// Returns the number of workers waiting for a request.
    pub fn idle_workers(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn checkout(&self) -> Option<NodeWorker> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }

    fn checkin(&self, worker: NodeWorker) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.worker_count {
            idle.push(worker);
        }
    }
}

impl TemplateCompiler for NodeRunner {
    fn compile(&self, request: &CompileRequest) -> Result<CompileOutput, BoxError> {
        Ok(self.run(request)?)
    }
}

fn find_node_in_bin(bin: &Utf8Path) -> Option<Utf8PathBuf> {
    let candidates: &[&str] = if cfg!(windows) {
        &["node.exe", "node.cmd", "node"]
    } else {
        &["node"]
    };

    candidates
        .iter()
        .map(|candidate| bin.join(candidate))
        .find(|path| path.exists())
}

#[derive(Debug)]
struct NodeWorker {
    child: Child,
    stdin: ChildStdin,
    stdout: io::Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
}

impl NodeWorker {
    fn spawn(
        node_path: &Utf8Path,
        workspace_root: &Utf8Path,
        script_path: &Utf8Path,
    ) -> Result<Self, NodeError> {
        debug!(node = %node_path, script = %script_path, "spawning node worker");
        let mut child = Command::new(node_path)
            .arg(script_path)
            .current_dir(workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(NodeError::SpawnFailed)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stderr".to_string()))?;

        let stderr_task = thread::spawn(move || {
            let mut buffer = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buffer);
            buffer
        });

        let mut worker = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            stderr_task: Some(stderr_task),
        };

        let Some(ready_line) = worker.next_line()? else {
            return Err(worker.exit_error());
        };

        let ready: NodeReady = serde_json::from_str(&ready_line)
            .map_err(|e| NodeError::ParseError(format!("invalid ready response: {e}")))?;
        if !ready.ready {
            return Err(NodeError::ProtocolError(format!(
                "unexpected node ready response: {ready_line}"
            )));
        }

        Ok(worker)
    }

    fn compile(&mut self, id: u64, request: &CompileRequest) -> Result<CompileOutput, NodeError> {
        let line = serde_json::to_string(&NodeRequest { id, request })
            .map_err(|e| NodeError::ProtocolError(format!("failed to serialize request: {e}")))?;
        writeln!(self.stdin, "{line}")
            .and_then(|()| self.stdin.flush())
            .map_err(|e| NodeError::ProtocolError(format!("failed to write to node stdin: {e}")))?;

        let Some(line) = self.next_line()? else {
            return Err(self.exit_error());
        };

        let response: NodeResponse = serde_json::from_str(&line)
            .map_err(|e| NodeError::ParseError(format!("invalid response: {e} ({line})")))?;

        if response.id != Some(id) {
            let message = response
                .error
                .unwrap_or_else(|| format!("expected response id {id}: {line}"));
            return Err(NodeError::ProtocolError(message));
        }
        if let Some(error) = response.error {
            return Err(NodeError::CompileFailed(error));
        }

        let code = response
            .code
            .ok_or_else(|| NodeError::ParseError(format!("response without code: {line}")))?;
        Ok(CompileOutput {
            code,
            tips: response.tips,
            errors: response.errors,
        })
    }

    fn next_line(&mut self) -> Result<Option<String>, NodeError> {
        self.stdout
            .next()
            .transpose()
            .map_err(|e| NodeError::ProtocolError(format!("failed to read node output: {e}")))
    }

    /// Builds the error for a worker whose stdout closed.
    fn exit_error(&mut self) -> NodeError {
        let stderr = match self.stderr_task.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => String::new(),
        };
        match self.child.wait() {
            Ok(status) => NodeError::ProcessFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            },
            Err(err) => NodeError::SpawnFailed(err),
        }
    }
}

impl Drop for NodeWorker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    fn request() -> CompileRequest {
        let mut options = Map::new();
        options.insert("prettify".into(), json!(false));
        CompileRequest {
            source: "<div/>".into(),
            filename: "App.vue".into(),
            options,
        }
    }

    #[test]
    fn test_request_is_flattened() {
        let request = request();
        let value = serde_json::to_value(NodeRequest {
            id: 7,
            request: &request,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "source": "<div/>",
                "filename": "App.vue",
                "options": { "prettify": false }
            })
        );
    }

    #[test]
    fn test_response_accepts_both_message_shapes() {
        let response: NodeResponse = serde_json::from_value(json!({
            "id": 1,
            "code": "var render",
            "tips": ["tip"],
            "errors": [{ "msg": "bad", "start": 0, "end": 3 }]
        }))
        .unwrap();
        assert_eq!(response.tips, vec![CompilerMessage::Plain("tip".into())]);
        assert_eq!(
            response.errors,
            vec![CompilerMessage::Ranged {
                message: "bad".into(),
                start: 0,
                end: 3
            }]
        );
    }

    #[test]
    fn test_missing_node_binary() {
        let err = NodeRunner::new("/definitely/not/here/node".into(), ".".into(), 1).unwrap_err();
        assert!(matches!(err, NodeError::NotFound(_)));
    }

    #[test]
    fn test_find_node_in_bin() {
        let dir = tempfile::tempdir().unwrap();
        let bin = Utf8Path::from_path(dir.path()).unwrap();
        assert_eq!(find_node_in_bin(bin), None);

        let name = if cfg!(windows) { "node.exe" } else { "node" };
        std::fs::write(bin.join(name), "").unwrap();
        assert_eq!(find_node_in_bin(bin), Some(bin.join(name)));
    }

    #[cfg(unix)]
    mod fake_worker {
        use super::*;
        use pretty_assertions::assert_eq;

        /// Runs a shell script in place of node.
        fn runner(script: &str) -> (tempfile::TempDir, NodeRunner) {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
            let script_path = root.join("worker.sh");
            std::fs::write(&script_path, script).unwrap();
            let runner = NodeRunner::with_script("/bin/sh".into(), root, script_path, 1);
            (dir, runner)
        }

        #[test]
        fn test_worker_round_trip_and_reuse() {
            let (_dir, runner) = runner(
                r#"echo '{"ready":true}'
n=0
while read -r line; do
  n=$((n + 1))
  echo "{\"id\":$n,\"code\":\"var render\",\"tips\":[\"tip $n\"],\"errors\":[]}"
done
"#,
            );

            let output = runner.run(&request()).unwrap();
            assert_eq!(output.code, "var render");
            assert_eq!(output.tips, vec![CompilerMessage::Plain("tip 1".into())]);
            assert_eq!(runner.idle_workers(), 1);

            let output = runner.run(&request()).unwrap();
            assert_eq!(output.tips, vec![CompilerMessage::Plain("tip 2".into())]);
        }

        #[test]
        fn test_compile_failure_keeps_worker() {
            let (_dir, runner) = runner(
                r#"echo '{"ready":true}'
while read -r line; do
  echo '{"id":1,"error":"Cannot find module pug"}'
done
"#,
            );

            let err = runner.run(&request()).unwrap_err();
            assert!(matches!(err, NodeError::CompileFailed(ref m) if m == "Cannot find module pug"));
            assert_eq!(runner.idle_workers(), 1);
        }

        #[test]
        fn test_mismatched_id_discards_worker() {
            let (_dir, runner) = runner(
                r#"echo '{"ready":true}'
while read -r line; do
  echo '{"id":99,"code":""}'
done
"#,
            );

            let err = runner.run(&request()).unwrap_err();
            assert!(matches!(err, NodeError::ProtocolError(_)));
            assert_eq!(runner.idle_workers(), 0);
        }

        #[test]
        fn test_early_exit_reports_stderr() {
            let (_dir, runner) = runner("echo 'no compiler' >&2\nexit 2\n");

            match runner.run(&request()).unwrap_err() {
                NodeError::ProcessFailed { code, stderr } => {
                    assert_eq!(code, 2);
                    assert_eq!(stderr, "no compiler\n");
                }
                other => panic!("expected process failure, got {other}"),
            }
        }

        #[test]
        fn test_runner_is_a_template_compiler() {
            let (_dir, runner) = runner(
                r#"echo '{"ready":true}'
while read -r line; do
  echo '{"id":1,"code":"var render","errors":["plain"]}'
done
"#,
            );

            let output = TemplateCompiler::compile(&runner, &request()).unwrap();
            assert_eq!(output.errors, vec![CompilerMessage::Plain("plain".into())]);
            assert!(output.tips.is_empty());
        }
    }
}
