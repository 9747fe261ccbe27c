/// Build configuration error types
use bootcfg_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown build profile '{0}': expected 'debug' or 'release'")]
    UnknownProfile(String),

    #[error("Source root not found: {}", .0.display())]
    SourceRootMissing(PathBuf),

    #[error("Source root is not a directory: {}", .0.display())]
    SourceRootNotDirectory(PathBuf),

    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to scan {}: {error}", .path.display())]
    DiscoveryError { path: PathBuf, error: String },

    #[error("No source files found under {}", .0.display())]
    NoSources(PathBuf),

    #[error("Delegation to '{name}' failed: {error}")]
    DelegationFailed { name: String, error: String },

    #[error("No build engine configured: set [engine] command in bootcfg.toml")]
    EngineNotConfigured,

    #[error("Failed to run build engine '{engine}': {error}")]
    EngineSpawnError { engine: String, error: String },

    #[error("Build engine '{engine}' failed with exit code {exit_code}\n{output}")]
    EngineFailed {
        engine: String,
        exit_code: i32,
        output: String,
    },

    #[error("Failed to write build plan: {0}")]
    PlanError(#[from] serde_json::Error),

    #[error("I/O error at {}: {error}", .path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a delegation failure
    pub fn delegation(name: impl Into<String>, error: impl ToString) -> Self {
        Self::DelegationFailed {
            name: name.into(),
            error: error.to_string(),
        }
    }

    /// Create a discovery error
    pub fn discovery(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::DiscoveryError {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Whether this error happened before anything touched the source tree
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnknownProfile(_)
                | Self::SourceRootMissing(_)
                | Self::SourceRootNotDirectory(_)
                | Self::InvalidPattern { .. }
                | Self::EngineNotConfigured
        )
    }
}
