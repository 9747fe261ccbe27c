//! Project Configuration (bootcfg.toml)
//!
//! Handles project-level configuration stored in `bootcfg.toml` at the project root.
//! Every section is optional; the defaults describe the osshs-bootloader layout.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Project configuration from bootcfg.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project identity
    #[serde(default)]
    pub project: ProjectSection,

    /// Directory layout and discovery settings
    #[serde(default)]
    pub build: BuildSection,

    /// Compiler flag rules
    #[serde(default)]
    pub flags: FlagSection,

    /// External build engine
    #[serde(default)]
    pub engine: EngineSection,
}

/// Project identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name, also the artifact name and output subdirectory
    pub name: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: "osshs-bootloader".to_string(),
        }
    }
}

/// Build layout configuration
///
/// All paths are relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct BuildSection {
    /// Build output base; the project output lands in `<root>/<name>`
    pub root: PathBuf,

    /// Persistent intermediate-artifact cache shared across invocations
    pub cache: PathBuf,

    /// Source discovery root
    pub source: PathBuf,

    /// Include roots seeded into the environment before delegation
    pub include: Vec<PathBuf>,

    /// Vendored header-only include roots, appended after discovery
    pub vendored_includes: Vec<PathBuf>,

    /// Directories hosting nested build descriptors, in delegation order
    pub delegate: Vec<PathBuf>,

    /// Extra exclusion globs on top of the fixed set
    pub ignore: Vec<String>,

    /// File extensions considered compilable
    pub extensions: Vec<String>,

    /// Profile used when neither the CLI nor the environment names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("build"),
            cache: PathBuf::from("build/cache"),
            source: PathBuf::from("src"),
            include: vec![PathBuf::from("include")],
            vendored_includes: vec![PathBuf::from("ext/magic_enum/include")],
            delegate: vec![PathBuf::from("modm")],
            ignore: Vec::new(),
            extensions: ["c", "cc", "cpp", "cxx", "c++", "s", "S", "sx"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            profile: None,
        }
    }
}

/// Compiler flag rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct FlagSection {
    /// Flags present for every profile
    pub always: Vec<String>,
    /// Flags appended when the profile is debug
    pub debug: Vec<String>,
    /// Flags appended when the profile is release
    pub release: Vec<String>,
}

impl Default for FlagSection {
    fn default() -> Self {
        Self {
            always: vec!["-fno-exceptions".to_string()],
            debug: vec!["-O0".to_string()],
            release: vec!["-DDISABLE_LOGGING".to_string()],
        }
    }
}

/// External build engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case", default)]
pub struct EngineSection {
    /// Engine argv; the first element is the program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Extension of the produced artifact
    pub artifact_extension: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            command: None,
            artifact_extension: "elf".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let name = &self.project.name;
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "project.name".to_string(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::InvalidValue {
                field: "project.name".to_string(),
                reason: format!("'{}' is not a valid directory name", name),
            });
        }

        let build = &self.build;
        let layout_paths = [&build.root, &build.cache, &build.source]
            .into_iter()
            .chain(&build.include)
            .chain(&build.vendored_includes)
            .chain(&build.delegate);
        for path in layout_paths {
            validate_relative(path)?;
        }

        if build.extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "build.extensions".to_string(),
                reason: "at least one source extension is required".to_string(),
            });
        }

        if let Some(command) = &self.engine.command {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "engine.command".to_string(),
                    reason: "command must name a program".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the project name
    pub fn project_name(&self) -> &str {
        &self.project.name
    }

    /// Get the configured default profile, if present
    pub fn default_profile(&self) -> Option<&str> {
        self.build.profile.as_deref()
    }
}

/// Layout paths are joined onto the project root, so they must not escape it
fn validate_relative(path: &Path) -> ConfigResult<()> {
    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if path.as_os_str().is_empty() || path.is_absolute() || escapes {
        return Err(ConfigError::InvalidPath(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_bootloader_layout() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert_eq!(config.project_name(), "osshs-bootloader");
        assert_eq!(config.build.root, PathBuf::from("build"));
        assert_eq!(config.build.cache, PathBuf::from("build/cache"));
        assert_eq!(config.build.delegate, vec![PathBuf::from("modm")]);
        assert_eq!(config.flags.always, vec!["-fno-exceptions"]);
        assert!(config.engine.command.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_project_config() {
        let toml = r#"
[project]
name = "probe"

[build]
root = "out"
cache = "out/cache"
source = "firmware"
include = ["include", "board/include"]
vendored-includes = []
delegate = ["hal", "usb"]
ignore = ["tests"]
extensions = ["c"]
profile = "release"

[flags]
always = ["-fno-exceptions", "-fno-rtti"]
debug = ["-Og"]
release = ["-DNDEBUG"]

[engine]
command = ["ninja", "-C", "out"]
artifact-extension = "bin"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.project_name(), "probe");
        assert_eq!(config.default_profile(), Some("release"));
        assert_eq!(config.build.delegate.len(), 2);
        assert_eq!(config.flags.debug, vec!["-Og"]);
        assert_eq!(config.engine.artifact_extension, "bin");
    }

    #[test]
    fn test_partial_build_section_keeps_defaults() {
        let config: ProjectConfig = toml::from_str("[build]\nroot = \"out\"\n").unwrap();
        assert_eq!(config.build.root, PathBuf::from("out"));
        assert_eq!(config.build.source, PathBuf::from("src"));
        assert_eq!(config.build.extensions.len(), 8);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ProjectConfig, _> = toml::from_str("[build]\nsources = \"src\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = ProjectConfig::default();
        config.project.name = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_name_with_separator_rejected() {
        let mut config = ProjectConfig::default();
        config.project.name = "boot/loader".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_absolute_layout_path_rejected() {
        let mut config = ProjectConfig::default();
        config.build.delegate = vec![PathBuf::from("/opt/modm")];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPath(_))));
    }

    #[test]
    fn test_escaping_layout_path_rejected() {
        let mut config = ProjectConfig::default();
        config.build.cache = PathBuf::from("../elsewhere");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPath(_))));

        config.build.cache = PathBuf::from("./build/cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_engine_command_rejected() {
        let mut config = ProjectConfig::default();
        config.engine.command = Some(Vec::new());
        assert!(config.validate().is_err());
    }
}
