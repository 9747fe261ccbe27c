//! Hand-off to the external build engine
//!
//! The dispatcher writes a JSON build plan next to the output, then asks a
//! [`BuildEngine`] to produce the artifact. Engine diagnostics are passed
//! through untouched.

use crate::discovery::SourceFileSet;
use crate::environment::BuildEnvironment;
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// File name of the build plan written into the output directory
pub const PLAN_FILE: &str = "build-plan.json";

/// Everything the engine needs for one artifact
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Project name
    pub project: String,
    /// Active profile name
    pub profile: String,
    /// Output directory
    pub build_base: PathBuf,
    /// Intermediate-artifact cache
    pub cache_dir: PathBuf,
    /// Artifact path the engine must produce
    pub artifact: PathBuf,
    /// Include paths in search order
    pub include_paths: Vec<PathBuf>,
    /// Compiler flags
    pub flags: Vec<String>,
    /// Source files
    pub sources: Vec<PathBuf>,
    /// Exported variables
    pub env: BTreeMap<String, String>,
}

impl BuildPlan {
    /// Build the plan for an environment and source set
    pub fn new(env: &BuildEnvironment, sources: &SourceFileSet, artifact: PathBuf) -> Self {
        Self {
            project: env.project_name().to_string(),
            profile: env.profile().name().to_string(),
            build_base: env.build_base().to_path_buf(),
            cache_dir: env.cache_dir().to_path_buf(),
            artifact,
            include_paths: env.include_search_order(),
            flags: env.flags().to_vec(),
            sources: sources.files().to_vec(),
            env: env.exports(),
        }
    }
}

/// Captured engine run
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Exit code
    pub exit_code: i32,
    /// Stdout output
    pub stdout: String,
    /// Stderr output
    pub stderr: String,
    /// Run time
    pub duration: Duration,
}

impl EngineOutput {
    /// Check if the engine succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output
    pub fn output(&self) -> String {
        let mut output = String::new();
        if !self.stdout.is_empty() {
            output.push_str("STDOUT:\n");
            output.push_str(&self.stdout);
            output.push('\n');
        }
        if !self.stderr.is_empty() {
            output.push_str("STDERR:\n");
            output.push_str(&self.stderr);
        }
        output
    }
}

/// External system that turns a plan into an artifact
pub trait BuildEngine {
    /// Engine name for logs and errors
    fn name(&self) -> &str;

    /// Produce the artifact described by `plan` (already written to `plan_path`)
    fn run(&self, plan: &BuildPlan, plan_path: &Path) -> BuildResult<Option<EngineOutput>>;
}

/// Engine that runs an external command
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandEngine {
    /// Create from an argv list; the first element is the program
    pub fn new(argv: &[String], working_dir: impl Into<PathBuf>) -> BuildResult<Self> {
        let (program, args) = argv.split_first().ok_or(BuildError::EngineNotConfigured)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.into(),
        })
    }
}

impl BuildEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, plan: &BuildPlan, plan_path: &Path) -> BuildResult<Option<EngineOutput>> {
        let start = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&plan.env)
            .env("BOOTCFG_PLAN", plan_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BuildError::EngineSpawnError {
                engine: self.program.clone(),
                error: e.to_string(),
            })?
            .wait_with_output()
            .map_err(|e| BuildError::EngineSpawnError {
                engine: self.program.clone(),
                error: e.to_string(),
            })?;

        let result = EngineOutput {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        };

        if !result.success() {
            return Err(BuildError::EngineFailed {
                engine: self.program.clone(),
                exit_code: result.exit_code,
                output: result.output(),
            });
        }

        Ok(Some(result))
    }
}

/// Engine that stops after the plan is written
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOnlyEngine;

impl BuildEngine for PlanOnlyEngine {
    fn name(&self) -> &str {
        "plan-only"
    }

    fn run(&self, _plan: &BuildPlan, plan_path: &Path) -> BuildResult<Option<EngineOutput>> {
        log::info!("build plan written to {}", plan_path.display());
        Ok(None)
    }
}

/// Result of a dispatch
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    /// Artifact path
    pub path: PathBuf,
    /// Plan file handed to the engine
    pub plan_path: PathBuf,
    /// Engine that ran
    pub engine: String,
    /// Engine output, if the engine ran
    pub output: Option<EngineOutput>,
}

impl BuildArtifact {
    /// Whether an engine actually produced the artifact
    pub fn was_built(&self) -> bool {
        self.output.is_some()
    }
}

/// Hands the final environment and sources to a build engine
pub struct BuildDispatcher {
    engine: Box<dyn BuildEngine>,
    artifact_extension: String,
}

impl BuildDispatcher {
    /// Create a dispatcher for an engine
    pub fn new(engine: Box<dyn BuildEngine>) -> Self {
        Self {
            engine,
            artifact_extension: "elf".to_string(),
        }
    }

    /// Set the artifact extension
    pub fn with_artifact_extension(mut self, extension: impl Into<String>) -> Self {
        self.artifact_extension = extension.into();
        self
    }

    /// Artifact extension
    pub fn artifact_extension(&self) -> &str {
        &self.artifact_extension
    }

    /// Engine name
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Artifact path for an environment, `<build-base>/<project>.<ext>`
    pub fn artifact_path(&self, env: &BuildEnvironment) -> PathBuf {
        let file_name = if self.artifact_extension.is_empty() {
            env.project_name().to_string()
        } else {
            format!("{}.{}", env.project_name(), self.artifact_extension)
        };
        env.build_base().join(file_name)
    }

    /// Request one artifact from the engine
    pub fn dispatch(
        &self,
        env: &BuildEnvironment,
        sources: &SourceFileSet,
    ) -> BuildResult<BuildArtifact> {
        if sources.is_empty() {
            return Err(BuildError::NoSources(env.build_base().to_path_buf()));
        }

        for dir in [env.build_base(), env.cache_dir()] {
            fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
        }

        let artifact = self.artifact_path(env);
        let plan = BuildPlan::new(env, sources, artifact.clone());
        let plan_path = env.build_base().join(PLAN_FILE);
        let json = serde_json::to_string_pretty(&plan)?;
        fs::write(&plan_path, json).map_err(|e| BuildError::io(&plan_path, e))?;

        log::info!(
            "dispatching {} ({} sources, profile {}) to {}",
            env.project_name(),
            sources.len(),
            env.profile(),
            self.engine.name()
        );

        let output = self.engine.run(&plan, &plan_path)?;

        Ok(BuildArtifact {
            path: artifact,
            plan_path,
            engine: self.engine.name().to_string(),
            output,
        })
    }
}

impl std::fmt::Debug for BuildDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildDispatcher")
            .field("engine", &self.engine.name())
            .field("artifact_extension", &self.artifact_extension)
            .finish()
    }
}
