//! Stderr backend for the `log` facade

use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct CliLogger {
    level: LevelFilter,
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!("{}: {}", tag(record.level()), record.args());
    }

    fn flush(&self) {}
}

fn tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "error".red().bold(),
        Level::Warn => "warning".yellow().bold(),
        Level::Info => "info".green(),
        Level::Debug => "debug".blue(),
        Level::Trace => "trace".dimmed(),
    }
}

/// Install the logger; fails if one is already set
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(CliLogger { level }))?;
    log::set_max_level(level);
    Ok(())
}
