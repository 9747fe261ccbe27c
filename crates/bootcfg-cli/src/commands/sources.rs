//! Sources command - list the files discovery would compile

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Sources command arguments
#[derive(Default)]
pub struct SourcesArgs {
    /// Print absolute paths
    pub absolute: bool,
    /// JSON output
    pub json: bool,
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
}

/// Run the sources command
pub fn run(args: SourcesArgs) -> Result<()> {
    let config = super::load_project(args.project_dir.as_deref())?;
    let mut pipeline = super::pipeline(&config, false)?;

    // An unrecognized profile passes through, so discovery always runs
    let configuration = pipeline
        .configure(None)
        .context("Failed to discover sources")?;

    let files: Vec<String> = if args.absolute {
        configuration
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    } else {
        super::display_paths(pipeline.project_root(), configuration.sources.files())
    };

    if args.json {
        println!("{}", serde_json::json!(files));
    } else {
        for file in files {
            println!("{}", file);
        }
    }

    Ok(())
}
