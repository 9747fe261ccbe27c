//! Bootloader build configuration
//!
//! Turns a project layout into one fully resolved build environment and
//! hands it to an external build engine:
//! - Profile resolution (debug / release)
//! - Exclusion patterns for output, cache and delegated directories
//! - Deterministic source discovery
//! - Environment composition from ordered deltas
//! - Delegation to nested build descriptors
//! - Dispatch through a JSON build plan

pub mod delegate;
pub mod discovery;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod ignore;
pub mod pipeline;
pub mod profile;

// Re-export main types
pub use delegate::{DelegationRecord, DescriptorSubBuild, StaticSubBuild, SubBuild, SubBuildDelegator};
pub use discovery::{SourceDiscoverer, SourceFileSet, DEFAULT_EXTENSIONS};
pub use dispatch::{
    BuildArtifact, BuildDispatcher, BuildEngine, BuildPlan, CommandEngine, EngineOutput,
    PlanOnlyEngine, PLAN_FILE,
};
pub use environment::{BuildEnvironment, EnvironmentComposer, EnvironmentDelta, FlagRules};
pub use error::{BuildError, BuildResult};
pub use ignore::{IgnorePattern, IgnoreSet, LOCAL_CACHE_PATTERNS};
pub use pipeline::{BuildReport, BuildStats, Configuration, Pipeline, Stage};
pub use profile::{Profile, ProfileResolver, UnknownProfilePolicy};

// Re-export bootcfg-config types for convenience
pub use bootcfg_config::{Config, ConfigLoader};
