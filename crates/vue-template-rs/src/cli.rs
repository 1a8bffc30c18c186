//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// Compiles Vue 2 single-file component templates into render function modules.
#[derive(Debug, Parser)]
#[command(name = "vue-template-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Components to compile (default: every .vue file in the workspace)
    pub files: Vec<Utf8PathBuf>,

    /// Project directory
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Config file, relative to the workspace (default: vue-template.config.json)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Compile for production
    #[arg(long)]
    pub production: bool,

    /// Directory for the generated modules (default: next to each component)
    #[arg(long = "out-dir")]
    pub out_dir: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Print the generated code to stderr (for debugging)
    #[arg(long = "emit-code")]
    pub emit_code: bool,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings")]
    pub fail_on_warnings: bool,

    /// Path to the node binary
    #[arg(long)]
    pub node: Option<Utf8PathBuf>,

    /// Number of node workers
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Show the node version and path, then exit
    #[arg(long = "node-version")]
    pub node_version: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}

impl Args {
    /// Returns the number of node workers to start.
    pub fn worker_count(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["vue-template-rs"]);
        assert_eq!(args.workspace.as_str(), ".");
        assert!(args.files.is_empty());
        assert_eq!(args.output, OutputFormat::Human);
        assert!(!args.production);
        assert!(!args.fail_on_warnings);
        assert!(args.out_dir.is_none());
    }

    #[test]
    fn test_files_and_flags() {
        let args = Args::parse_from([
            "vue-template-rs",
            "--production",
            "--out-dir",
            "dist",
            "--ignore",
            "legacy/**",
            "--ignore",
            "**/*.spec.vue",
            "src/App.vue",
            "src/Nav.vue",
        ]);
        assert!(args.production);
        assert_eq!(args.out_dir.as_deref().map(|p| p.as_str()), Some("dist"));
        assert_eq!(args.ignore, vec!["legacy/**", "**/*.spec.vue"]);
        assert_eq!(
            args.files,
            vec![Utf8PathBuf::from("src/App.vue"), Utf8PathBuf::from("src/Nav.vue")]
        );
    }

    #[test]
    fn test_output_formats() {
        let args = Args::parse_from(["vue-template-rs", "--output", "json"]);
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_worker_count() {
        let args = Args::parse_from(["vue-template-rs", "-j", "0"]);
        assert_eq!(args.worker_count(), 1);

        let args = Args::parse_from(["vue-template-rs", "--jobs", "3"]);
        assert_eq!(args.worker_count(), 3);
    }
}
