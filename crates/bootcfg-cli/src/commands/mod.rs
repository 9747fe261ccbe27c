pub mod build;
pub mod env;
pub mod sources;

use anyhow::{Context, Result};
use bootcfg_build::{Pipeline, UnknownProfilePolicy};
use bootcfg_config::{Config, ConfigLoader};
use std::path::{Path, PathBuf};

/// Load bootcfg.toml for `project_dir` (or the working directory)
pub(crate) fn load_project(project_dir: Option<&Path>) -> Result<Config> {
    let start = match project_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = ConfigLoader::new()
        .load_from_directory(&start)
        .with_context(|| format!("Failed to load configuration from {}", start.display()))?;

    if !config.is_project() {
        log::debug!(
            "no bootcfg.toml found above {}, using the default layout",
            start.display()
        );
    }

    Ok(config)
}

/// Build a pipeline for a loaded project
pub(crate) fn pipeline(config: &Config, strict_profile: bool) -> Result<Pipeline> {
    let pipeline = Pipeline::new(config).context("Failed to set up build pipeline")?;
    Ok(if strict_profile {
        pipeline.with_profile_policy(UnknownProfilePolicy::Reject)
    } else {
        pipeline
    })
}

/// Profile requested on the command line; `--release` wins
pub(crate) fn requested_profile(profile: Option<String>, release: bool) -> Option<String> {
    if release {
        Some("release".to_string())
    } else {
        profile
    }
}

/// Path relative to the project root for display
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Paths relative to the project root for display
pub(crate) fn display_paths(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| display_path(root, p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_flag_wins() {
        assert_eq!(
            requested_profile(Some("debug".to_string()), true),
            Some("release".to_string())
        );
        assert_eq!(
            requested_profile(Some("debug".to_string()), false),
            Some("debug".to_string())
        );
        assert_eq!(requested_profile(None, false), None);
    }

    #[test]
    fn test_display_paths() {
        let root = Path::new("/p");
        let shown = display_paths(
            root,
            &[PathBuf::from("/p/src/main.cpp"), PathBuf::from("/elsewhere/x.c")],
        );
        assert_eq!(shown, vec!["src/main.cpp", "/elsewhere/x.c"]);
    }
}
