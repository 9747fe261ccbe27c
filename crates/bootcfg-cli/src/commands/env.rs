//! Env command - print the composed environment without dispatching

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Env command arguments
#[derive(Default)]
pub struct EnvArgs {
    /// Build profile (debug or release)
    pub profile: Option<String>,
    /// Shorthand for --profile=release
    pub release: bool,
    /// Fail on an unrecognized profile
    pub strict_profile: bool,
    /// JSON output
    pub json: bool,
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
}

/// Run the env command
pub fn run(args: EnvArgs) -> Result<()> {
    let config = super::load_project(args.project_dir.as_deref())?;
    let mut pipeline = super::pipeline(&config, args.strict_profile)?;

    let profile = super::requested_profile(args.profile, args.release);
    let configuration = pipeline
        .configure(profile.as_deref())
        .context("Failed to compose build environment")?;
    let env = &configuration.environment;

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "profile": configuration.profile.name(),
                "project": env.project_name(),
                "build_base": env.build_base(),
                "cache_dir": env.cache_dir(),
                "include_paths": env.include_search_order(),
                "flags": env.flags(),
                "exports": env.exports(),
                "ignore": configuration.ignore.patterns().collect::<Vec<_>>(),
            })
        );
        return Ok(());
    }

    for (key, value) in env.exports() {
        println!("{}={}", key, value);
    }

    Ok(())
}
