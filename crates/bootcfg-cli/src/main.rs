use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;
mod config;
mod logger;

/// Build configuration for the osshs bootloader.
///
/// Resolves the build profile, composes the compiler environment, lets nested
/// dependencies (modm) extend it, discovers sources and hands everything to
/// the build engine.
///
/// EXAMPLES:
///     bootcfg build                     Debug build
///     bootcfg build --release           Release build
///     bootcfg build --dry-run           Write build-plan.json only
///     bootcfg env --profile release     Show the release environment
///     bootcfg sources                   List files that will be compiled
///
/// ENVIRONMENT VARIABLES:
///     BOOTCFG_PROFILE     Default profile (debug or release)
///     BOOTCFG_BUILD_ROOT  Build output base (default: build)
///     BOOTCFG_JSON        Set to '1' for JSON output by default
///     BOOTCFG_LOG         Log level (error, warn, info, debug, trace, off)
///     NO_COLOR            Set to disable colored output
#[derive(Parser)]
#[command(name = "bootcfg")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure and build the bootloader
    ///
    /// Resolves bootcfg.toml, composes the environment for the selected
    /// profile, runs nested build descriptors, discovers sources and
    /// dispatches to the configured engine. Without an engine command, or
    /// with --dry-run, only the build plan is written.
    ///
    /// EXAMPLES:
    ///     bootcfg build                   Build with the default profile
    ///     bootcfg build --release         Build with logging compiled out
    ///     bootcfg build --profile=debug   Explicit debug build
    ///     bootcfg build --dry-run --json  Emit the plan summary as JSON
    #[command(visible_alias = "b")]
    Build {
        /// Build profile (debug or release; overrides BOOTCFG_PROFILE)
        #[arg(long, short = 'p')]
        profile: Option<String>,
        /// Build in release mode (shorthand for --profile=release)
        #[arg(long, conflicts_with = "profile")]
        release: bool,
        /// Write the build plan without running the engine
        #[arg(long, short = 'n')]
        dry_run: bool,
        /// Fail on a profile other than debug or release instead of adding no profile flags
        #[arg(long)]
        strict_profile: bool,
        /// Project directory (defaults to current directory)
        #[arg(long, short = 'C')]
        project_dir: Option<PathBuf>,
        /// Verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Quiet output (errors only)
        #[arg(long, short = 'q')]
        quiet: bool,
        /// JSON output
        #[arg(long, env = "BOOTCFG_JSON")]
        json: bool,
    },

    /// Print the composed build environment
    ///
    /// Runs every stage short of dispatch and prints the variables the
    /// build engine would receive.
    ///
    /// EXAMPLES:
    ///     bootcfg env                      Debug environment as KEY=VALUE
    ///     bootcfg env --release --json     Release environment as JSON
    #[command(visible_alias = "e")]
    Env {
        /// Build profile (debug or release; overrides BOOTCFG_PROFILE)
        #[arg(long, short = 'p')]
        profile: Option<String>,
        /// Shorthand for --profile=release
        #[arg(long, conflicts_with = "profile")]
        release: bool,
        /// Fail on a profile other than debug or release
        #[arg(long)]
        strict_profile: bool,
        /// Project directory (defaults to current directory)
        #[arg(long, short = 'C')]
        project_dir: Option<PathBuf>,
        /// Verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
        /// JSON output
        #[arg(long, env = "BOOTCFG_JSON")]
        json: bool,
    },

    /// List the source files that would be compiled
    ///
    /// EXAMPLES:
    ///     bootcfg sources                 Paths relative to the project
    ///     bootcfg sources --absolute      Absolute paths
    #[command(visible_alias = "s")]
    Sources {
        /// Print absolute paths
        #[arg(long)]
        absolute: bool,
        /// Project directory (defaults to current directory)
        #[arg(long, short = 'C')]
        project_dir: Option<PathBuf>,
        /// Verbose output
        #[arg(long, short = 'v')]
        verbose: bool,
        /// JSON output
        #[arg(long, env = "BOOTCFG_JSON")]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     bootcfg completions bash > ~/.bash_completions/bootcfg.bash
    ///     bootcfg completions zsh > ~/.zfunc/_bootcfg
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Commands {
    fn verbosity(&self) -> (bool, bool) {
        match self {
            Commands::Build { verbose, quiet, .. } => (*verbose, *quiet),
            Commands::Env { verbose, .. } | Commands::Sources { verbose, .. } => (*verbose, false),
            Commands::Completions { .. } => (false, true),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    if cli_config.no_color {
        colored::control::set_override(false);
    }

    let (verbose, quiet) = cli.command.verbosity();
    logger::init(cli_config.level(verbose, quiet))?;

    match cli.command {
        Commands::Build {
            profile,
            release,
            dry_run,
            strict_profile,
            project_dir,
            verbose: _,
            quiet,
            json,
        } => {
            let args = commands::build::BuildArgs {
                profile,
                release,
                dry_run,
                strict_profile,
                quiet,
                json: json || cli_config.default_json,
                project_dir,
            };
            commands::build::run(args)?;
        }
        Commands::Env {
            profile,
            release,
            strict_profile,
            project_dir,
            verbose: _,
            json,
        } => {
            let args = commands::env::EnvArgs {
                profile,
                release,
                strict_profile,
                json: json || cli_config.default_json,
                project_dir,
            };
            commands::env::run(args)?;
        }
        Commands::Sources {
            absolute,
            project_dir,
            verbose: _,
            json,
        } => {
            let args = commands::sources::SourcesArgs {
                absolute,
                json: json || cli_config.default_json,
                project_dir,
            };
            commands::sources::run(args)?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
        }
    }

    Ok(())
}
