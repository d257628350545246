//! The `gen` command: run the full reconciliation pipeline.

use std::path::PathBuf;

use console::style;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{self, RunSummary};

/// CLI overrides for one `gen` invocation.
#[derive(Debug, Default)]
pub struct GenOptions {
    pub schema_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
    pub format: bool,
    pub compiler_cmd: Option<String>,
    pub rate_output: Option<PathBuf>,
}

/// Merge CLI options over the loaded config and run the pipeline.
pub fn execute_gen(mut config: Config, options: GenOptions) -> Result<RunSummary> {
    if let Some(path) = options.schema_path {
        config.schema_path = path;
    }
    if let Some(dir) = options.output_dir {
        config.output_dir = Some(dir);
    }
    if let Some(root) = options.project_root {
        config.project_root = root;
    }
    if options.format {
        config.format_output = true;
    }
    if options.compiler_cmd.is_some() {
        config.compiler_cmd = options.compiler_cmd;
    }
    if options.rate_output.is_some() {
        config.rate_output = options.rate_output;
    }

    let summary = pipeline::run(&config)?;

    for file in &summary.processed {
        println!("{} {}", style("synced").green().bold(), file.display());
    }
    for (file, err) in &summary.failed {
        println!(
            "{} {}: {}",
            style("failed").red().bold(),
            file.display(),
            err
        );
    }
    Ok(summary)
}
