//! Delegation to nested build descriptors
//!
//! A dependency that owns its build description is modelled as a
//! [`SubBuild`]: it sees the environment read-only and answers with the
//! additions it needs. The delegator folds those additions in the order the
//! delegates were registered.

use crate::environment::{normalize, BuildEnvironment, EnvironmentDelta};
use crate::error::{BuildError, BuildResult};
use bootcfg_config::SubBuildDescriptor;
use std::path::{Path, PathBuf};

/// A dependency that extends the shared environment
pub trait SubBuild {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Directory the dependency occupies; excluded from source discovery
    fn directory(&self) -> &Path;

    /// Additions this dependency makes to the environment
    fn extend(&self, env: &BuildEnvironment) -> BuildResult<EnvironmentDelta>;
}

/// Sub-build backed by a `subbuild.toml` in the dependency directory
#[derive(Debug, Clone)]
pub struct DescriptorSubBuild {
    name: String,
    dir: PathBuf,
}

impl DescriptorSubBuild {
    /// Create a sub-build for `relative_dir` under the project root
    pub fn new(project_root: &Path, relative_dir: &Path) -> Self {
        let dir = normalize(&project_root.join(relative_dir));
        let name = relative_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| relative_dir.display().to_string());
        Self { name, dir }
    }
}

impl SubBuild for DescriptorSubBuild {
    fn name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.dir
    }

    fn extend(&self, _env: &BuildEnvironment) -> BuildResult<EnvironmentDelta> {
        if !self.dir.is_dir() {
            return Err(BuildError::delegation(
                &self.name,
                format!("directory not found: {}", self.dir.display()),
            ));
        }

        let descriptor = SubBuildDescriptor::load_from_dir(&self.dir)
            .map_err(|e| BuildError::delegation(&self.name, e))?;
        if let Some(display) = &descriptor.name {
            log::debug!("delegate '{}' describes itself as '{}'", self.name, display);
        }

        Ok(EnvironmentDelta {
            include_paths: descriptor
                .include
                .iter()
                .map(|p| normalize(&self.dir.join(p)))
                .collect(),
            flags: descriptor.flags,
        })
    }
}

/// Sub-build with a fixed contribution, for dependencies described in code
#[derive(Debug, Clone)]
pub struct StaticSubBuild {
    name: String,
    dir: PathBuf,
    delta: EnvironmentDelta,
}

impl StaticSubBuild {
    /// Create a static sub-build
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, delta: EnvironmentDelta) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            delta,
        }
    }
}

impl SubBuild for StaticSubBuild {
    fn name(&self) -> &str {
        &self.name
    }

    fn directory(&self) -> &Path {
        &self.dir
    }

    fn extend(&self, _env: &BuildEnvironment) -> BuildResult<EnvironmentDelta> {
        Ok(self.delta.clone())
    }
}

/// What one delegate contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    /// Delegate name
    pub name: String,
    /// Include paths it appended
    pub include_paths: usize,
    /// Flags it appended
    pub flags: usize,
}

/// Runs sub-builds in registration order
#[derive(Default)]
pub struct SubBuildDelegator {
    delegates: Vec<Box<dyn SubBuild>>,
}

impl SubBuildDelegator {
    /// Create an empty delegator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create descriptor-backed delegates for each directory, in order
    pub fn from_dirs(project_root: &Path, dirs: &[PathBuf]) -> Self {
        let mut delegator = Self::new();
        for dir in dirs {
            delegator.push(Box::new(DescriptorSubBuild::new(project_root, dir)));
        }
        delegator
    }

    /// Register a delegate after the existing ones
    pub fn push(&mut self, delegate: Box<dyn SubBuild>) {
        self.delegates.push(delegate);
    }

    /// Register a delegate (builder style)
    pub fn with_delegate(mut self, delegate: impl SubBuild + 'static) -> Self {
        self.push(Box::new(delegate));
        self
    }

    /// Number of delegates
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Check if there are no delegates
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    /// Delegated directories, in registration order
    pub fn directories(&self) -> Vec<PathBuf> {
        self.delegates
            .iter()
            .map(|d| d.directory().to_path_buf())
            .collect()
    }

    /// Let every delegate extend the environment
    ///
    /// Stops at the first failure; the environment then holds the additions
    /// of the delegates that ran before it, and the caller must not continue.
    pub fn delegate(&self, env: &mut BuildEnvironment) -> BuildResult<Vec<DelegationRecord>> {
        let mut records = Vec::with_capacity(self.delegates.len());

        for delegate in &self.delegates {
            let delta = delegate.extend(env)?;
            log::debug!(
                "delegate '{}' adds {} include paths, {} flags",
                delegate.name(),
                delta.include_paths.len(),
                delta.flags.len()
            );
            records.push(DelegationRecord {
                name: delegate.name().to_string(),
                include_paths: delta.include_paths.len(),
                flags: delta.flags.len(),
            });
            env.apply(delta);
        }

        Ok(records)
    }
}

impl std::fmt::Debug for SubBuildDelegator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubBuildDelegator")
            .field(
                "delegates",
                &self.delegates.iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
