//! Nested build descriptors (subbuild.toml)
//!
//! A delegated dependency owns a `subbuild.toml` in its directory describing
//! what it adds to the shared build environment. It can only add: include
//! roots (relative to the dependency directory) and compiler flags.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of a nested build descriptor
pub const DESCRIPTOR_FILE: &str = "subbuild.toml";

/// Nested build descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SubBuildDescriptor {
    /// Display name (defaults to the directory name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Include roots, relative to the descriptor's directory
    #[serde(default)]
    pub include: Vec<PathBuf>,

    /// Compiler flags appended to the shared flag list
    #[serde(default)]
    pub flags: Vec<String>,
}

impl SubBuildDescriptor {
    /// Load the descriptor hosted in `dir`
    pub fn load_from_dir(dir: &Path) -> ConfigResult<Self> {
        Self::load_from_file(&dir.join(DESCRIPTOR_FILE))
    }

    /// Load a descriptor from a specific file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let descriptor: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;

        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Validate the descriptor
    pub fn validate(&self) -> ConfigResult<()> {
        for include in &self.include {
            if include.is_absolute() {
                return Err(ConfigError::InvalidPath(include.clone()));
            }
        }

        if self.flags.iter().any(|flag| flag.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "flags".to_string(),
                reason: "flags cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}
