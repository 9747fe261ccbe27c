//! CLI configuration via environment variables
//!
//! Project layout lives in bootcfg.toml; these only affect how the CLI
//! reports.

use log::LevelFilter;
use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON output (BOOTCFG_JSON=1)
    pub default_json: bool,
    /// Disable colored output (NO_COLOR=1)
    pub no_color: bool,
    /// Log level (BOOTCFG_LOG=debug|info|warn|error|off)
    pub log_level: Option<LevelFilter>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("BOOTCFG_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var_os("NO_COLOR").is_some(),
            log_level: env::var("BOOTCFG_LOG")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Effective log level; command-line flags win over BOOTCFG_LOG
    pub fn level(&self, verbose: bool, quiet: bool) -> LevelFilter {
        if quiet {
            LevelFilter::Error
        } else if verbose {
            LevelFilter::Debug
        } else {
            self.log_level.unwrap_or(LevelFilter::Warn)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
}
