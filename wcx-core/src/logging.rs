//! Log output: a daily file next to the host's ini, or stderr for the command-line harness.
//!
//! Code logs through the `log` macros; the `tracing-log` bridge installed by
//! `tracing_subscriber` forwards those records to the subscriber set up here.

use std::fs;
use std::io;
use std::path::Path;

use log::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{self, EnvFilter};
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::config::{PluginConfig, LEVEL_ENV};

pub const LOG_FILE_PREFIX: &str = "Ba2Wcx";
pub const LOG_FILE_SUFFIX: &str = "log";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn tracing_level(level: LevelFilter) -> filter::LevelFilter {
    match level {
        LevelFilter::Off => filter::LevelFilter::OFF,
        LevelFilter::Error => filter::LevelFilter::ERROR,
        LevelFilter::Warn => filter::LevelFilter::WARN,
        LevelFilter::Info => filter::LevelFilter::INFO,
        LevelFilter::Debug => filter::LevelFilter::DEBUG,
        LevelFilter::Trace => filter::LevelFilter::TRACE,
    }
}

/// `level` unless the environment variable `env_var` names another filter.
pub fn level_filter(level: LevelFilter, env_var: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(tracing_level(level).into())
        .with_env_var(env_var)
        .from_env_lossy()
}

/// `Ba2Wcx.<yyyy-MM-dd>.log` in `dir`, one file per day.
pub fn daily_appender(dir: &Path) -> io::Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(dir)
        .map_err(io::Error::other)
}

/// Install the daily file log described by `config`, honouring `BA2WCX_LOG`.
///
/// Returns `false` when no directory is known, the directory cannot be used,
/// or a subscriber is already installed.
pub fn init(config: &PluginConfig) -> bool {
    let Some(dir) = &config.log_dir else {
        return false;
    };
    let appender = match daily_appender(dir) {
        Ok(appender) => appender,
        Err(_) => return false,
    };

    tracing_subscriber::fmt()
        .with_env_filter(level_filter(config.log_level, LEVEL_ENV))
        .with_writer(appender)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .try_init()
        .is_ok()
}

pub fn init_stderr(level: LevelFilter) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(level_filter(level, LEVEL_ENV))
        .with_writer(io::stderr)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .try_init()
        .is_ok()
}
