//! Build configuration pipeline
use crate::delegate::{DelegationRecord, SubBuildDelegator};
use crate::discovery::{SourceDiscoverer, SourceFileSet};
use crate::dispatch::{BuildArtifact, BuildDispatcher, BuildEngine, CommandEngine, PlanOnlyEngine};
use crate::environment::{BuildEnvironment, EnvironmentComposer};
use crate::error::BuildResult;
use crate::ignore::IgnoreSet;
use crate::profile::{Profile, ProfileResolver, UnknownProfilePolicy};

use bootcfg_config::Config;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Pipeline progress. Each stage is entered only after the previous one succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unconfigured,
    ProfileResolved,
    EnvironmentComposed,
    Delegated,
    Discovered,
    Dispatched,
    Failed,
}

impl Stage {
    /// Get stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::ProfileResolved => "profile-resolved",
            Self::EnvironmentComposed => "environment-composed",
            Self::Delegated => "delegated",
            Self::Discovered => "discovered",
            Self::Dispatched => "dispatched",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully resolved configuration, ready for dispatch
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Active profile
    pub profile: Profile,
    /// Final environment
    pub environment: BuildEnvironment,
    /// Discovered sources
    pub sources: SourceFileSet,
    /// Exclusion patterns used for discovery
    pub ignore: IgnoreSet,
    /// What each delegate contributed
    pub delegations: Vec<DelegationRecord>,
}

/// Pipeline timings
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of discovered sources
    pub sources: usize,
    /// Number of delegates run
    pub delegates: usize,
    /// Time spent resolving configuration
    pub configure_time: Duration,
    /// Time spent in the engine
    pub dispatch_time: Duration,
    /// Total time
    pub total_time: Duration,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Resolved configuration
    pub configuration: Configuration,
    /// Produced artifact
    pub artifact: BuildArtifact,
    /// Statistics
    pub stats: BuildStats,
}

/// Drives profile resolution, composition, delegation, discovery and dispatch
#[derive(Debug)]
pub struct Pipeline {
    project_root: PathBuf,
    default_profile: Option<String>,
    resolver: ProfileResolver,
    composer: EnvironmentComposer,
    delegator: SubBuildDelegator,
    discoverer: SourceDiscoverer,
    extra_ignores: Vec<String>,
    dispatcher: BuildDispatcher,
    stage: Stage,
}

impl Pipeline {
    /// Create a pipeline from resolved configuration
    ///
    /// Uses the configured engine command if there is one, otherwise only the
    /// plan is written.
    pub fn new(config: &Config) -> BuildResult<Self> {
        let project = &config.project;
        let composer = EnvironmentComposer::from_config(config);
        let project_root = composer.project_root().to_path_buf();

        let engine: Box<dyn BuildEngine> = match &project.engine.command {
            Some(argv) => Box::new(CommandEngine::new(argv, &project_root)?),
            None => Box::new(PlanOnlyEngine),
        };

        Ok(Self {
            default_profile: project.default_profile().map(str::to_string),
            resolver: ProfileResolver::new(),
            delegator: SubBuildDelegator::from_dirs(&project_root, &project.build.delegate),
            discoverer: SourceDiscoverer::new(project_root.join(&project.build.source))
                .with_extensions(project.build.extensions.clone()),
            extra_ignores: project.build.ignore.clone(),
            dispatcher: BuildDispatcher::new(engine)
                .with_artifact_extension(project.engine.artifact_extension.clone()),
            composer,
            project_root,
            stage: Stage::Unconfigured,
        })
    }

    /// Create a pipeline from explicit parts
    pub fn from_parts(
        composer: EnvironmentComposer,
        delegator: SubBuildDelegator,
        discoverer: SourceDiscoverer,
        dispatcher: BuildDispatcher,
    ) -> Self {
        Self {
            project_root: composer.project_root().to_path_buf(),
            default_profile: None,
            resolver: ProfileResolver::new(),
            composer,
            delegator,
            discoverer,
            extra_ignores: Vec::new(),
            dispatcher,
            stage: Stage::Unconfigured,
        }
    }

    /// Set the unknown-profile policy
    pub fn with_profile_policy(mut self, policy: UnknownProfilePolicy) -> Self {
        self.resolver = self.resolver.with_policy(policy);
        self
    }

    /// Replace the build engine
    pub fn with_engine(mut self, engine: Box<dyn BuildEngine>) -> Self {
        let extension = self.dispatcher.artifact_extension().to_string();
        self.dispatcher = BuildDispatcher::new(engine).with_artifact_extension(extension);
        self
    }

    /// Add exclusion patterns on top of the fixed set
    pub fn with_ignores(mut self, patterns: Vec<String>) -> Self {
        self.extra_ignores.extend(patterns);
        self
    }

    /// Project root
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Resolve everything short of dispatch
    ///
    /// `profile` overrides the configured default; neither means debug.
    pub fn configure(&mut self, profile: Option<&str>) -> BuildResult<Configuration> {
        self.stage = Stage::Unconfigured;
        let result = self.run_configure(profile);
        if result.is_err() {
            self.stage = Stage::Failed;
        }
        result
    }

    /// Resolve and dispatch
    pub fn run(&mut self, profile: Option<&str>) -> BuildResult<BuildReport> {
        let start = Instant::now();

        let configuration = self.configure(profile)?;
        let configure_time = start.elapsed();

        let dispatch_start = Instant::now();
        let artifact = match self
            .dispatcher
            .dispatch(&configuration.environment, &configuration.sources)
        {
            Ok(artifact) => artifact,
            Err(e) => {
                self.stage = Stage::Failed;
                return Err(e);
            }
        };
        self.advance(Stage::Dispatched);

        let stats = BuildStats {
            sources: configuration.sources.len(),
            delegates: configuration.delegations.len(),
            configure_time,
            dispatch_time: dispatch_start.elapsed(),
            total_time: start.elapsed(),
        };

        Ok(BuildReport {
            configuration,
            artifact,
            stats,
        })
    }

    fn run_configure(&mut self, profile: Option<&str>) -> BuildResult<Configuration> {
        let raw = profile.or(self.default_profile.as_deref());
        let profile = self.resolver.resolve(raw)?;
        self.advance(Stage::ProfileResolved);

        self.discoverer.check_root()?;

        let mut environment = self.composer.compose_base(&profile);
        self.advance(Stage::EnvironmentComposed);

        let delegations = self.delegator.delegate(&mut environment)?;
        self.advance(Stage::Delegated);

        let mut ignore = IgnoreSet::for_build(
            &self.project_root,
            environment.build_base(),
            environment.cache_dir(),
            &self.delegator.directories(),
        )?;
        ignore.extend(&self.extra_ignores)?;

        let sources = self.discoverer.discover(&ignore)?;
        self.advance(Stage::Discovered);

        environment.apply(self.composer.vendored_delta());
        environment.apply(self.composer.flag_delta(&profile));

        Ok(Configuration {
            profile,
            environment,
            sources,
            ignore,
            delegations,
        })
    }

    fn advance(&mut self, stage: Stage) {
        log::debug!("{} -> {}", self.stage, stage);
        self.stage = stage;
    }
}
