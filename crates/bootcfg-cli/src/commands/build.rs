//! Build command - resolve the configuration and hand it to the build engine

use anyhow::{Context, Result};
use bootcfg_build::{BuildReport, PlanOnlyEngine};
use colored::*;
use std::path::{Path, PathBuf};

/// Build command arguments
#[derive(Default)]
pub struct BuildArgs {
    /// Build profile (debug or release)
    pub profile: Option<String>,
    /// Build in release mode (shorthand for --profile=release)
    pub release: bool,
    /// Write the build plan without running the engine
    pub dry_run: bool,
    /// Fail on an unrecognized profile
    pub strict_profile: bool,
    /// Quiet output (errors only)
    pub quiet: bool,
    /// JSON output
    pub json: bool,
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
}

/// Run the build command
pub fn run(args: BuildArgs) -> Result<()> {
    let config = super::load_project(args.project_dir.as_deref())?;
    let mut pipeline = super::pipeline(&config, args.strict_profile)?;

    if args.dry_run {
        pipeline = pipeline.with_engine(Box::new(PlanOnlyEngine));
    }

    let profile = super::requested_profile(args.profile.clone(), args.release);
    let report = pipeline.run(profile.as_deref()).context("Build failed")?;

    if args.json {
        println!("{}", summary_json(&report));
    } else if !args.quiet {
        print_summary(&report, pipeline.project_root());
    }

    Ok(())
}

fn summary_json(report: &BuildReport) -> serde_json::Value {
    let configuration = &report.configuration;
    let output = report.artifact.output.as_ref();
    serde_json::json!({
        "success": true,
        "profile": configuration.profile.name(),
        "artifact": report.artifact.path,
        "plan": report.artifact.plan_path,
        "engine": report.artifact.engine,
        "built": report.artifact.was_built(),
        "sources": report.stats.sources,
        "delegates": configuration.delegations.iter().map(|d| &d.name).collect::<Vec<_>>(),
        "flags": configuration.environment.flags(),
        "include_paths": configuration.environment.include_search_order(),
        "configure_time": report.stats.configure_time.as_secs_f64(),
        "dispatch_time": report.stats.dispatch_time.as_secs_f64(),
        "total_time": report.stats.total_time.as_secs_f64(),
        "stdout": output.map(|o| o.stdout.as_str()),
        "stderr": output.map(|o| o.stderr.as_str()),
    })
}

fn print_summary(report: &BuildReport, root: &Path) {
    let configuration = &report.configuration;
    let artifact = &report.artifact;

    if let Some(output) = &artifact.output {
        print!("{}", output.stdout);
        eprint!("{}", output.stderr);
    }

    let headline = if artifact.was_built() {
        format!(
            "Build succeeded in {:.2}s",
            report.stats.total_time.as_secs_f64()
        )
    } else {
        "Build plan written (engine not run)".to_string()
    };

    println!("\n{}", "=".repeat(60));
    println!("{}", headline.green().bold());
    println!("{}", "=".repeat(60));
    println!("  Profile:   {}", configuration.profile);
    println!("  Sources:   {}", report.stats.sources);
    println!("  Delegates: {}", report.stats.delegates);
    println!("  Flags:     {}", configuration.environment.flags().join(" "));
    println!("  Artifact:  {}", super::display_path(root, &artifact.path));
    println!("  Plan:      {}", super::display_path(root, &artifact.plan_path));
    println!("  Engine:    {}", artifact.engine);
    println!("{}", "=".repeat(60));
}
