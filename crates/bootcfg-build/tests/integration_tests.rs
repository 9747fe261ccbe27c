//! Pipeline integration tests
//!
//! End-to-end runs over temporary project trees

use bootcfg_build::{
    BuildError, CommandEngine, Config, Pipeline, Profile, Stage, UnknownProfilePolicy, PLAN_FILE,
};
use bootcfg_config::ProjectConfig;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// Bootloader layout: two sources, a nested modm build, one vendored include
fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    touch(&root.join("src/a.cpp"));
    touch(&root.join("src/b.cpp"));
    touch(&root.join("src/board.hpp"));
    fs::create_dir_all(root.join("include")).unwrap();
    fs::create_dir_all(root.join("ext/magic_enum/include")).unwrap();

    fs::create_dir_all(root.join("modm/src")).unwrap();
    fs::write(
        root.join("modm/subbuild.toml"),
        "name = \"modm\"\ninclude = [\"src\"]\nflags = [\"-DMODM_STM32\"]\n",
    )
    .unwrap();

    temp_dir
}

fn config_for(root: &Path, project: ProjectConfig) -> Config {
    Config {
        project,
        project_root: root.to_path_buf(),
        found_descriptor: false,
    }
}

fn default_config(root: &Path) -> Config {
    config_for(root, ProjectConfig::default())
}

fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            f.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_discovery_excludes_output_root() {
    let project = create_test_project();
    let root = project.path();

    // Source root at the project root, output tree inside it
    touch(&root.join("a.cpp"));
    touch(&root.join("b.cpp"));
    touch(&root.join("build/osshs-bootloader/gen.cpp"));

    let mut project_config = ProjectConfig::default();
    project_config.build.source = PathBuf::from(".");
    project_config.build.vendored_includes.clear();

    let mut pipeline = Pipeline::new(&config_for(root, project_config)).unwrap();
    let configuration = pipeline.configure(None).unwrap();

    let found = names(root, configuration.sources.files());
    assert!(found.contains(&"a.cpp".to_string()));
    assert!(found.contains(&"b.cpp".to_string()));
    assert!(!found.iter().any(|f| f.starts_with("build/")));
    assert!(!found.iter().any(|f| f.starts_with("modm/")));
}

#[test]
fn test_discovery_excludes_output_root_under_source_root() {
    let project = create_test_project();
    let root = project.path();
    touch(&root.join("src/build/osshs-bootloader/gen.cpp"));

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let configuration = pipeline.configure(None).unwrap();

    assert_eq!(
        names(root, configuration.sources.files()),
        vec!["src/a.cpp", "src/b.cpp"]
    );
}

#[test]
fn test_delegated_dir_name_inside_sources_is_kept() {
    let project = create_test_project();
    let root = project.path();
    touch(&root.join("src/drivers/modm/glue.cpp"));
    touch(&root.join("modm/src/gpio.cpp"));

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let configuration = pipeline.configure(None).unwrap();

    assert_eq!(
        names(root, configuration.sources.files()),
        vec!["src/a.cpp", "src/b.cpp", "src/drivers/modm/glue.cpp"]
    );
}

#[test]
fn test_discovery_skips_caches_and_delegates() {
    let project = create_test_project();
    let root = project.path();

    touch(&root.join("src/cmake-build-debug/generated.c"));
    touch(&root.join("src/.lbuild_cache/stale.cpp"));
    touch(&root.join("modm/src/modm/platform/gpio.cpp"));
    touch(&root.join("build/cache/obj.cpp"));

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let configuration = pipeline.configure(None).unwrap();

    assert_eq!(
        names(root, configuration.sources.files()),
        vec!["src/a.cpp", "src/b.cpp"]
    );
}

#[test]
fn test_debug_configuration() {
    let project = create_test_project();
    let root = project.path();

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let configuration = pipeline.configure(None).unwrap();
    let env = &configuration.environment;

    assert_eq!(configuration.profile, Profile::Debug);
    assert_eq!(env.build_base(), root.join("build/osshs-bootloader"));
    assert_eq!(env.cache_dir(), root.join("build/cache"));
    assert_eq!(env.flags(), &["-DMODM_STM32", "-fno-exceptions", "-O0"]);
    assert_eq!(
        env.include_paths(),
        &[
            root.join("include"),
            root.join("modm/src"),
            root.join("ext/magic_enum/include"),
        ]
    );
    assert_eq!(pipeline.stage(), Stage::Discovered);
}

#[test]
fn test_release_configuration_differs_only_in_conditional_flag() {
    let project = create_test_project();
    let root = project.path();

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let debug = pipeline.configure(Some("debug")).unwrap();
    let release = pipeline.configure(Some("release")).unwrap();

    assert!(release.environment.has_flag("-DDISABLE_LOGGING"));
    assert!(!release.environment.has_flag("-O0"));
    assert_eq!(
        debug.environment.include_paths(),
        release.environment.include_paths()
    );
    assert_eq!(debug.sources, release.sources);
}

#[test]
fn test_configured_default_profile() {
    let project = create_test_project();
    let root = project.path();

    let mut project_config = ProjectConfig::default();
    project_config.build.profile = Some("release".to_string());

    let mut pipeline = Pipeline::new(&config_for(root, project_config)).unwrap();
    assert_eq!(pipeline.configure(None).unwrap().profile, Profile::Release);
    assert_eq!(
        pipeline.configure(Some("debug")).unwrap().profile,
        Profile::Debug
    );
}

#[test]
fn test_unknown_profile_passes_through() {
    let project = create_test_project();
    let mut pipeline = Pipeline::new(&default_config(project.path())).unwrap();

    let configuration = pipeline.configure(Some("size")).unwrap();
    assert_eq!(
        configuration.profile,
        Profile::Unrecognized("size".to_string())
    );
    assert_eq!(
        configuration.environment.flags(),
        &["-DMODM_STM32", "-fno-exceptions"]
    );
    assert_eq!(configuration.sources.len(), 2);
}

#[test]
fn test_profile_match_is_case_sensitive() {
    let project = create_test_project();
    let mut pipeline = Pipeline::new(&default_config(project.path())).unwrap();

    let configuration = pipeline.configure(Some("Release")).unwrap();
    assert!(!configuration.environment.has_flag("-DDISABLE_LOGGING"));
    assert!(!configuration.environment.has_flag("-O0"));
    assert_eq!(configuration.environment.exports()["CONFIG_PROFILE"], "Release");
}

#[test]
fn test_strict_profile_fails_before_discovery() {
    let project = create_test_project();
    let mut pipeline = Pipeline::new(&default_config(project.path()))
        .unwrap()
        .with_profile_policy(UnknownProfilePolicy::Reject);

    let err = pipeline.configure(Some("profiling")).unwrap_err();
    assert!(matches!(err, BuildError::UnknownProfile(_)));
    assert_eq!(pipeline.stage(), Stage::Failed);
}

#[test]
fn test_missing_source_root_fails_fast() {
    let project = create_test_project();
    fs::remove_dir_all(project.path().join("src")).unwrap();
    // Delegation would also fail; the source root check must come first
    fs::remove_dir_all(project.path().join("modm")).unwrap();

    let mut pipeline = Pipeline::new(&default_config(project.path())).unwrap();
    let err = pipeline.run(None).unwrap_err();

    assert!(matches!(err, BuildError::SourceRootMissing(_)));
    assert!(!project.path().join("build").exists());
}

#[test]
fn test_delegation_failure_halts_run() {
    let project = create_test_project();
    fs::write(project.path().join("modm/subbuild.toml"), "include = [").unwrap();

    let mut pipeline = Pipeline::new(&default_config(project.path())).unwrap();
    let err = pipeline.run(None).unwrap_err();

    assert!(matches!(err, BuildError::DelegationFailed { ref name, .. } if name == "modm"));
    assert_eq!(pipeline.stage(), Stage::Failed);
    assert!(!project
        .path()
        .join("build/osshs-bootloader")
        .join(PLAN_FILE)
        .exists());
}

#[test]
fn test_no_sources_is_an_error() {
    let project = create_test_project();
    fs::remove_file(project.path().join("src/a.cpp")).unwrap();
    fs::remove_file(project.path().join("src/b.cpp")).unwrap();

    let mut pipeline = Pipeline::new(&default_config(project.path())).unwrap();
    let err = pipeline.run(None).unwrap_err();
    assert!(matches!(err, BuildError::NoSources(_)));
}

#[test]
fn test_discovery_is_deterministic() {
    let project = create_test_project();
    let root = project.path();
    for name in ["zeta.c", "alpha.S", "mid/dle.cc", "mid/a.cxx"] {
        touch(&root.join("src").join(name));
    }

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let first = pipeline.configure(None).unwrap().sources;
    let second = pipeline.configure(None).unwrap().sources;

    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[test]
fn test_extra_ignore_patterns() {
    let project = create_test_project();
    let root = project.path();
    touch(&root.join("src/tests/test_flash.cpp"));

    let mut pipeline = Pipeline::new(&default_config(root))
        .unwrap()
        .with_ignores(vec!["tests".to_string()]);
    let configuration = pipeline.configure(None).unwrap();

    assert_eq!(configuration.sources.len(), 2);
    assert!(configuration.ignore.patterns().any(|p| p == "tests"));
}

#[test]
fn test_dry_run_writes_plan() {
    let project = create_test_project();
    let root = project.path();

    let mut pipeline = Pipeline::new(&default_config(root)).unwrap();
    let report = pipeline.run(Some("release")).unwrap();

    assert!(!report.artifact.was_built());
    assert_eq!(report.artifact.engine, "plan-only");
    assert_eq!(
        report.artifact.path,
        root.join("build/osshs-bootloader/osshs-bootloader.elf")
    );
    assert_eq!(report.stats.sources, 2);
    assert_eq!(report.stats.delegates, 1);
    assert_eq!(pipeline.stage(), Stage::Dispatched);
    assert!(root.join("build/cache").is_dir());

    let plan: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report.artifact.plan_path).unwrap()).unwrap();
    assert_eq!(plan["profile"], "release");
    assert_eq!(plan["project"], "osshs-bootloader");
    assert_eq!(plan["sources"].as_array().unwrap().len(), 2);
    assert_eq!(plan["env"]["CONFIG_PROFILE"], "release");
    assert_eq!(
        plan["flags"],
        serde_json::json!(["-DMODM_STM32", "-fno-exceptions", "-DDISABLE_LOGGING"])
    );
}

#[cfg(unix)]
#[test]
fn test_command_engine_receives_environment() {
    let project = create_test_project();
    let root = project.path();

    let engine = CommandEngine::new(
        &[
            "sh".to_string(),
            "-c".to_string(),
            "test -f \"$BOOTCFG_PLAN\" && echo \"$CONFIG_PROJECT_NAME:$CONFIG_PROFILE\"".to_string(),
        ],
        root,
    )
    .unwrap();

    let mut pipeline = Pipeline::new(&default_config(root))
        .unwrap()
        .with_engine(Box::new(engine));
    let report = pipeline.run(None).unwrap();

    let output = report.artifact.output.unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "osshs-bootloader:debug");
}

#[cfg(unix)]
#[test]
fn test_command_engine_failure_is_reported() {
    let project = create_test_project();
    let root = project.path();

    let mut project_config = ProjectConfig::default();
    project_config.engine.command = Some(vec![
        "sh".to_string(),
        "-c".to_string(),
        "echo 'flash.cpp:3: error' >&2; exit 3".to_string(),
    ]);

    let mut pipeline = Pipeline::new(&config_for(root, project_config)).unwrap();
    let err = pipeline.run(None).unwrap_err();

    match err {
        BuildError::EngineFailed {
            engine,
            exit_code,
            output,
        } => {
            assert_eq!(engine, "sh");
            assert_eq!(exit_code, 3);
            assert!(output.contains("flash.cpp:3: error"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pipeline.stage(), Stage::Failed);
}
