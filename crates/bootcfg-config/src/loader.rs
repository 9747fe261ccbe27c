//! Configuration Loader
//!
//! Handles locating the project descriptor and applying environment overrides.

use crate::project::ProjectConfig;
use crate::ConfigResult;
use std::env;
use std::path::{Path, PathBuf};

/// File name of the project descriptor
pub const PROJECT_FILE: &str = "bootcfg.toml";

/// Configuration loader
///
/// Resolves configuration with the following precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Project config (./bootcfg.toml) - overrides defaults
/// 3. Environment variables (BOOTCFG_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Project root directory (where bootcfg.toml was found, or the start directory)
    pub project_root: PathBuf,

    /// Whether a bootcfg.toml was found
    pub found_descriptor: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find bootcfg.toml. When none exists the
    /// start directory becomes the project root and the defaults apply.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = match self.find_project_config(start_dir)? {
            Some((root, config)) => (root, Some(config)),
            None => (start_dir.to_path_buf(), None),
        };

        let found_descriptor = project_config.is_some();
        let project_config = self.apply_env_overrides(project_config.unwrap_or_default())?;

        Ok(Config {
            project: project_config,
            project_root,
            found_descriptor,
        })
    }

    /// Load configuration from a specific project descriptor
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_config = self.apply_env_overrides(project_config)?;

        let project_root = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Config {
            project: project_config,
            project_root,
            found_descriptor: true,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<Option<(PathBuf, ProjectConfig)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok(Some((current, project_config)));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Apply environment variable overrides to project config
    ///
    /// BOOTCFG_BUILD_ROOT replaces `[build] root`, BOOTCFG_PROFILE replaces
    /// `[build] profile`.
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(root) = env::var("BOOTCFG_BUILD_ROOT") {
            if !root.is_empty() {
                config.build.root = PathBuf::from(root);
            }
        }

        if let Ok(profile) = env::var("BOOTCFG_PROFILE") {
            if !profile.is_empty() {
                config.build.profile = Some(profile);
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the project name
    pub fn project_name(&self) -> &str {
        self.project.project_name()
    }

    /// Check if a project descriptor was found
    pub fn is_project(&self) -> bool {
        self.found_descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    #[serial]
    fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[project]\nname = \"probe\"\n");

        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert_eq!(config.project_name(), "probe");
        assert!(config.is_project());
        assert_eq!(config.project_root(), temp_dir.path());
    }

    #[test]
    #[serial]
    fn test_no_project_config_uses_start_dir() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();

        assert!(!config.is_project());
        assert_eq!(config.project_name(), "osshs-bootloader");
        assert_eq!(config.project_root(), temp_dir.path());
    }

    #[test]
    #[serial]
    fn test_env_override_build_root() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[build]\nroot = \"build\"\n");

        env::set_var("BOOTCFG_BUILD_ROOT", "out");
        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();
        env::remove_var("BOOTCFG_BUILD_ROOT");

        assert_eq!(config.project.build.root, PathBuf::from("out"));
    }

    #[test]
    #[serial]
    fn test_load_from_specific_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config_file(temp_dir.path(), "[project]\nname = \"specific\"\n");

        let config = ConfigLoader::new().load_from_file(&config_path).unwrap();

        assert_eq!(config.project_name(), "specific");
        assert_eq!(config.project_root(), temp_dir.path());
    }
}
