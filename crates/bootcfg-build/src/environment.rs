//! Build environment composition
//!
//! The environment carries the identifying keys of a build (output base,
//! project name, profile, cache directory) plus the include-path and flag
//! lists handed to the build engine. Keys are fixed when the environment is
//! composed. Later stages contribute an [`EnvironmentDelta`], and folding a
//! delta can only append.

use crate::profile::Profile;
use bootcfg_config::{Config, FlagSection};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Additions a stage contributes to the shared environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDelta {
    /// Include paths to append
    pub include_paths: Vec<PathBuf>,
    /// Compiler flags to append
    pub flags: Vec<String>,
}

impl EnvironmentDelta {
    /// Create an empty delta
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include path
    pub fn with_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Add a compiler flag
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// Append another delta after this one
    pub fn extend(&mut self, other: EnvironmentDelta) {
        self.include_paths.extend(other.include_paths);
        self.flags.extend(other.flags);
    }

    /// Check if the delta adds nothing
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty() && self.flags.is_empty()
    }
}

/// Shared build environment for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildEnvironment {
    build_base: PathBuf,
    project_name: String,
    profile: Profile,
    cache_dir: PathBuf,
    include_paths: Vec<PathBuf>,
    flags: Vec<String>,
}

impl BuildEnvironment {
    /// Absolute output directory, `<build-root>/<project-name>`
    pub fn build_base(&self) -> &Path {
        &self.build_base
    }

    /// Project name
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Active profile
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Absolute intermediate-artifact cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Include paths in append order
    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Compiler flags in append order
    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    /// Check whether a flag is present
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Fold a delta into the environment. Only appends.
    pub fn apply(&mut self, delta: EnvironmentDelta) {
        self.include_paths.extend(delta.include_paths);
        self.flags.extend(delta.flags);
    }

    /// Include paths as the engine should search them.
    ///
    /// A path appended more than once keeps only its last position, so a
    /// later delegate that re-adds a path wins over the earlier entry.
    pub fn include_search_order(&self) -> Vec<PathBuf> {
        let mut order: Vec<PathBuf> = Vec::with_capacity(self.include_paths.len());
        for (idx, path) in self.include_paths.iter().enumerate() {
            let repeated_later = self.include_paths[idx + 1..].contains(path);
            if !repeated_later {
                order.push(path.clone());
            }
        }
        order
    }

    /// Variables exported to the build engine process
    pub fn exports(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        env.insert(
            "CONFIG_BUILD_BASE".to_string(),
            self.build_base.display().to_string(),
        );
        env.insert("CONFIG_PROJECT_NAME".to_string(), self.project_name.clone());
        env.insert("CONFIG_PROFILE".to_string(), self.profile.name().to_string());
        env.insert(
            "CONFIG_CACHE_DIR".to_string(),
            self.cache_dir.display().to_string(),
        );

        let cpppath = std::env::join_paths(self.include_search_order())
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_else(|_| {
                self.include_search_order()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(":")
            });
        env.insert("CPPPATH".to_string(), cpppath);
        env.insert("CCFLAGS".to_string(), self.flags.join(" "));

        env
    }
}

/// Compiler flag rules: one unconditional set, one set per supported profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagRules {
    /// Flags for every profile
    pub always: Vec<String>,
    /// Flags when the profile is debug
    pub debug: Vec<String>,
    /// Flags when the profile is release
    pub release: Vec<String>,
}

impl FlagRules {
    /// Flags the profile-conditional rule adds
    pub fn conditional(&self, profile: &Profile) -> &[String] {
        match profile {
            Profile::Debug => &self.debug,
            Profile::Release => &self.release,
            Profile::Unrecognized(_) => &[],
        }
    }
}

impl Default for FlagRules {
    fn default() -> Self {
        FlagSection::default().into()
    }
}

impl From<FlagSection> for FlagRules {
    fn from(section: FlagSection) -> Self {
        Self {
            always: section.always,
            debug: section.debug,
            release: section.release,
        }
    }
}

/// Composes the base environment and the flag deltas
#[derive(Debug, Clone)]
pub struct EnvironmentComposer {
    project_root: PathBuf,
    project_name: String,
    build_root: PathBuf,
    cache_dir: PathBuf,
    include_roots: Vec<PathBuf>,
    vendored_includes: Vec<PathBuf>,
    rules: FlagRules,
}

impl EnvironmentComposer {
    /// Create a composer with the default layout
    pub fn new(project_root: impl AsRef<Path>, project_name: impl Into<String>) -> Self {
        Self {
            project_root: absolutize(project_root.as_ref()),
            project_name: project_name.into(),
            build_root: PathBuf::from("build"),
            cache_dir: PathBuf::from("build/cache"),
            include_roots: vec![PathBuf::from("include")],
            vendored_includes: Vec::new(),
            rules: FlagRules::default(),
        }
    }

    /// Create a composer from resolved configuration
    pub fn from_config(config: &Config) -> Self {
        let build = &config.project.build;
        Self::new(config.project_root(), config.project_name())
            .with_build_root(&build.root)
            .with_cache_dir(&build.cache)
            .with_include_roots(build.include.clone())
            .with_vendored_includes(build.vendored_includes.clone())
            .with_flag_rules(config.project.flags.clone().into())
    }

    /// Set the build output base (relative to the project root)
    pub fn with_build_root(mut self, build_root: impl Into<PathBuf>) -> Self {
        self.build_root = build_root.into();
        self
    }

    /// Set the cache directory (relative to the project root)
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Set the include roots seeded into the base environment
    pub fn with_include_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.include_roots = roots;
        self
    }

    /// Set the vendored include roots appended after discovery
    pub fn with_vendored_includes(mut self, includes: Vec<PathBuf>) -> Self {
        self.vendored_includes = includes;
        self
    }

    /// Set flag rules
    pub fn with_flag_rules(mut self, rules: FlagRules) -> Self {
        self.rules = rules;
        self
    }

    /// Absolute project root
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute output directory, `<project-root>/<build-root>/<project-name>`
    pub fn output_dir(&self) -> PathBuf {
        normalize(&self.project_root.join(&self.build_root).join(&self.project_name))
    }

    /// Absolute cache directory
    pub fn cache_dir(&self) -> PathBuf {
        normalize(&self.project_root.join(&self.cache_dir))
    }

    /// Compose the base environment: keys set, project include roots seeded, no flags
    pub fn compose_base(&self, profile: &Profile) -> BuildEnvironment {
        BuildEnvironment {
            build_base: self.output_dir(),
            project_name: self.project_name.clone(),
            profile: profile.clone(),
            cache_dir: self.cache_dir(),
            include_paths: self.resolve_all(&self.include_roots),
            flags: Vec::new(),
        }
    }

    /// Vendored include paths appended once sources are known
    pub fn vendored_delta(&self) -> EnvironmentDelta {
        EnvironmentDelta {
            include_paths: self.resolve_all(&self.vendored_includes),
            flags: Vec::new(),
        }
    }

    /// The unconditional flags followed by the profile-conditional ones
    pub fn flag_delta(&self, profile: &Profile) -> EnvironmentDelta {
        let mut flags = self.rules.always.clone();
        flags.extend(self.rules.conditional(profile).iter().cloned());
        EnvironmentDelta {
            include_paths: Vec::new(),
            flags,
        }
    }

    /// Compose a complete environment without delegation
    pub fn compose(&self, profile: &Profile) -> BuildEnvironment {
        let mut env = self.compose_base(profile);
        env.apply(self.vendored_delta());
        env.apply(self.flag_delta(profile));
        env
    }

    fn resolve_all(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths
            .iter()
            .map(|p| normalize(&self.project_root.join(p)))
            .collect()
    }
}

/// Make a path absolute against the working directory, lexically
pub(crate) fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

/// Drop `.` components and fold `..` without touching the filesystem
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> EnvironmentComposer {
        EnvironmentComposer::new("/work/boot", "osshs-bootloader")
            .with_vendored_includes(vec![PathBuf::from("ext/magic_enum/include")])
    }

    #[test]
    fn test_output_dir_is_absolute() {
        let composer = composer();
        assert_eq!(
            composer.output_dir(),
            PathBuf::from("/work/boot/build/osshs-bootloader")
        );
        assert!(composer.output_dir().is_absolute());
        assert_eq!(composer.cache_dir(), PathBuf::from("/work/boot/build/cache"));
    }

    #[test]
    fn test_relative_project_root_made_absolute() {
        let composer = EnvironmentComposer::new("./boot/../boot", "fw");
        assert!(composer.project_root().is_absolute());
        assert!(composer.output_dir().ends_with("boot/build/fw"));
    }

    #[test]
    fn test_base_environment_keys() {
        let env = composer().compose_base(&Profile::Release);
        assert_eq!(env.project_name(), "osshs-bootloader");
        assert_eq!(env.profile(), &Profile::Release);
        assert_eq!(env.include_paths(), &[PathBuf::from("/work/boot/include")]);
        assert!(env.flags().is_empty());
    }

    #[test]
    fn test_debug_flags() {
        let env = composer().compose(&Profile::Debug);
        assert_eq!(env.flags(), &["-fno-exceptions", "-O0"]);
    }

    #[test]
    fn test_release_flags() {
        let env = composer().compose(&Profile::Release);
        assert_eq!(env.flags(), &["-fno-exceptions", "-DDISABLE_LOGGING"]);
    }

    #[test]
    fn test_unrecognized_profile_gets_only_unconditional_flags() {
        let env = composer().compose(&Profile::Unrecognized("size".to_string()));
        assert_eq!(env.flags(), &["-fno-exceptions"]);
    }

    #[test]
    fn test_apply_appends_only() {
        let mut env = composer().compose_base(&Profile::Debug);
        let before = env.clone();
        env.apply(
            EnvironmentDelta::new()
                .with_include("/work/boot/modm/src")
                .with_flag("-DMODM"),
        );
        assert_eq!(env.project_name(), before.project_name());
        assert_eq!(env.build_base(), before.build_base());
        assert_eq!(env.include_paths()[0], before.include_paths()[0]);
        assert_eq!(env.include_paths().len(), 2);
        assert_eq!(env.flags(), &["-DMODM"]);
    }

    #[test]
    fn test_include_search_order_keeps_last_duplicate() {
        let mut env = composer().compose_base(&Profile::Debug);
        env.apply(EnvironmentDelta::new().with_include("/a").with_include("/b"));
        env.apply(EnvironmentDelta::new().with_include("/a"));
        assert_eq!(env.include_paths().len(), 4);
        assert_eq!(
            env.include_search_order(),
            vec![
                PathBuf::from("/work/boot/include"),
                PathBuf::from("/b"),
                PathBuf::from("/a"),
            ]
        );
    }

    #[test]
    fn test_exports() {
        let env = composer().compose(&Profile::Release);
        let exports = env.exports();
        assert_eq!(
            exports.get("CONFIG_BUILD_BASE").map(String::as_str),
            Some("/work/boot/build/osshs-bootloader")
        );
        assert_eq!(
            exports.get("CONFIG_PROJECT_NAME").map(String::as_str),
            Some("osshs-bootloader")
        );
        assert_eq!(exports.get("CONFIG_PROFILE").map(String::as_str), Some("release"));
        assert_eq!(
            exports.get("CCFLAGS").map(String::as_str),
            Some("-fno-exceptions -DDISABLE_LOGGING")
        );
        assert!(exports["CPPPATH"].contains("/work/boot/ext/magic_enum/include"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("./build/x")), PathBuf::from("build/x"));
    }
}
