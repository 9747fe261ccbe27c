//! bootcfg configuration system
//!
//! Provides configuration management for bootloader build projects:
//! - Project descriptor (bootcfg.toml)
//! - Nested build descriptors for delegated dependencies (subbuild.toml)
//! - Configuration precedence and environment overrides
//!
//! # Configuration Hierarchy
//!
//! Configuration is resolved in the following order (later overrides earlier):
//! 1. Built-in defaults (the osshs-bootloader layout)
//! 2. Project descriptor (./bootcfg.toml)
//! 3. Environment variables (BOOTCFG_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use bootcfg_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("building {}", config.project_name());
//! ```

pub mod loader;
pub mod project;
pub mod subbuild;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Path must be relative to the project root: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader, PROJECT_FILE};
pub use project::{BuildSection, EngineSection, FlagSection, ProjectConfig, ProjectSection};
pub use subbuild::{SubBuildDescriptor, DESCRIPTOR_FILE};
