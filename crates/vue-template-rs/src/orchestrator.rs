//! Main orchestration logic.

use crate::cli::{Args, OutputFormat};
use crate::config::{ConfigError, ProjectConfig};
use crate::output::{BuildSummary, FileReport, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use miette::Diagnostic as MietteDiagnostic;
use node_runner::{NodeError, NodeRunner};
use rayon::prelude::*;
use sfc_parser::parse_sfc;
use source_map::SourceMapError;
use std::fs;
use template_compiler::{
    block_content, compile_sfc_template, Diagnostic, Severity, TemplateCompiler, TemplateOptions,
};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum OrchestratorError {
    /// The working directory could not be determined.
    #[error("failed to resolve the workspace: {0}")]
    Workspace(String),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Invalid config file.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No node binary was found.
    #[error("node binary not found")]
    #[diagnostic(help("install Node.js, or pass its path with --node"))]
    NodeNotFound,

    /// The node runner failed to start.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// A source map could not be serialized.
    #[error(transparent)]
    SourceMap(#[from] SourceMapError),

    /// Diagnostics could not be serialized for output.
    #[error("failed to serialize diagnostics: {0}")]
    Output(#[from] serde_json::Error),

    /// A generated file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one compile run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// The project directory.
    pub workspace: Utf8PathBuf,
    /// Where generated modules go, mirroring the workspace layout.
    pub out_dir: Option<Utf8PathBuf>,
    /// Print generated code to stderr.
    pub emit_code: bool,
    /// Output format for diagnostics.
    pub output: OutputFormat,
    /// Fail the run on warnings.
    pub fail_on_warnings: bool,
}

/// Runs the compiler on all files.
pub fn run(args: Args) -> Result<BuildSummary, OrchestratorError> {
    let workspace = absolute_workspace(&args.workspace)?;

    let config = ProjectConfig::load(&workspace, args.config.as_deref())?;
    let options = config.template_options(&workspace, args.production);

    let ignore_set = build_ignore_set(&args.ignore)?;
    let files = if args.files.is_empty() {
        find_components(&workspace, &ignore_set)
    } else {
        args.files.iter().map(|file| workspace.join(file)).collect()
    };
    info!(count = files.len(), %workspace, "found components");

    let node = locate_node(&args)?;
    let runner = NodeRunner::new(node, workspace.clone(), args.worker_count())?;

    let settings = RunSettings {
        out_dir: args.out_dir.as_ref().map(|dir| workspace.join(dir)),
        workspace,
        emit_code: args.emit_code,
        output: args.output,
        fail_on_warnings: args.fail_on_warnings,
    };

    let (summary, reports) = compile_files(&files, &options, &runner, &settings)?;

    print!("{}", render_reports(&reports, &summary, settings.output)?);

    Ok(summary)
}

/// Renders every report, followed by the summary in human output.
fn render_reports(
    reports: &[FileReport],
    summary: &BuildSummary,
    format: OutputFormat,
) -> Result<String, OrchestratorError> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let all: Vec<_> = reports
                .iter()
                .flat_map(Formatter::format_json_diagnostics)
                .collect();
            out.push_str(&serde_json::to_string_pretty(&all)?);
        }
        OutputFormat::Human => {
            let formatter = Formatter::new(format);
            for report in reports {
                out.push_str(&formatter.format(report)?);
            }
            out.push_str(&summary.format());
        }
    }
    out.push('\n');
    Ok(out)
}

/// Finds the node binary from `--node`, the workspace, or PATH.
pub fn locate_node(args: &Args) -> Result<Utf8PathBuf, OrchestratorError> {
    if let Some(node) = &args.node {
        return Ok(node.clone());
    }
    let workspace = absolute_workspace(&args.workspace)?;
    NodeRunner::find_node(Some(&workspace)).ok_or(OrchestratorError::NodeNotFound)
}

fn absolute_workspace(workspace: &Utf8Path) -> Result<Utf8PathBuf, OrchestratorError> {
    if workspace.is_absolute() {
        return Ok(workspace.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| OrchestratorError::Workspace(e.to_string()))?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| OrchestratorError::Workspace(e.to_string()))?;
    Ok(cwd.join(workspace))
}

/// Builds the ignore set from user globs plus the default ignores.
fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    let defaults = ["**/node_modules/**", "**/dist/**"];
    for pattern in patterns.iter().map(String::as_str).chain(defaults) {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Walks the workspace for `.vue` files not matched by `ignore_set`.
fn find_components(workspace: &Utf8Path, ignore_set: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| p.extension() == Some("vue"))
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !ignore_set.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

/// Compiles every component in parallel, writing the generated modules.
///
/// Reports come back in the order of `files`, with empty ones dropped.
pub fn compile_files<C>(
    files: &[Utf8PathBuf],
    options: &TemplateOptions,
    compiler: &C,
    settings: &RunSettings,
) -> Result<(BuildSummary, Vec<FileReport>), OrchestratorError>
where
    C: TemplateCompiler + Sync + ?Sized,
{
    let outcomes = files
        .par_iter()
        .map(|file| compile_file(file, options, compiler, settings))
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = BuildSummary {
        file_count: files.len(),
        fail_on_warnings: settings.fail_on_warnings,
        ..BuildSummary::default()
    };
    let mut reports = Vec::new();
    for (compiled, report) in outcomes {
        summary.compiled_count += usize::from(compiled);
        summary.error_count += report.error_count();
        summary.warning_count += report.warning_count();
        if !report.is_empty() {
            reports.push(report);
        }
    }

    Ok((summary, reports))
}

/// Compiles one component. Returns whether a template was compiled.
fn compile_file<C>(
    file: &Utf8Path,
    options: &TemplateOptions,
    compiler: &C,
    settings: &RunSettings,
) -> Result<(bool, FileReport), OrchestratorError>
where
    C: TemplateCompiler + ?Sized,
{
    let filename = file.as_str();
    let mut report = FileReport {
        path: file
            .strip_prefix(&settings.workspace)
            .unwrap_or(file)
            .to_path_buf(),
        ..FileReport::default()
    };

    report.source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            report.diagnostics.push(Diagnostic::new(
                filename,
                format!("failed to read component: {e}"),
                Severity::Error,
            ));
            return Ok((false, report));
        }
    };

    let parsed = parse_sfc(&report.source);
    report.parse_errors = parsed.errors;

    let Some(block) = parsed.descriptor.template else {
        debug!(filename, "no template block");
        return Ok((false, report));
    };

    let result = block_content(&block, filename).and_then(|source| {
        compile_sfc_template(
            &source,
            Some(&block),
            filename,
            options,
            compiler,
            &mut report.diagnostics,
        )
    });

    // A failure here only affects this component
    let output = match result {
        Ok(output) => output,
        Err(err) => {
            report
                .diagnostics
                .push(Diagnostic::new(filename, err.to_string(), Severity::Error));
            return Ok((false, report));
        }
    };

    if settings.emit_code {
        eprintln!("=== code for {} ===\n{}", report.path, output.code);
    }

    let js_path = output_path(file, settings);
    write_file(&js_path, &output.code)?;
    if let Some(map) = &output.map {
        write_file(&map_path(&js_path), &map.to_json()?)?;
    }
    debug!(filename, output = %js_path, "wrote template module");

    Ok((true, report))
}

/// `src/App.vue` becomes `src/App.template.js`, under `--out-dir` if set.
fn output_path(file: &Utf8Path, settings: &RunSettings) -> Utf8PathBuf {
    let name = format!("{}.template.js", file.file_stem().unwrap_or("component"));
    match &settings.out_dir {
        Some(out_dir) => {
            let relative = file.strip_prefix(&settings.workspace).unwrap_or(file);
            match relative.parent() {
                Some(parent) if relative.is_relative() => out_dir.join(parent).join(name),
                _ => out_dir.join(name),
            }
        }
        None => file.with_file_name(name),
    }
}

fn map_path(js_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{js_path}.map"))
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<(), OrchestratorError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    };
    write().map_err(|source| OrchestratorError::Write {
        path: path.to_path_buf(),
        source,
    })
}
