//! Plugin settings, read once from the host's ini file.
//!
//! ```ini
//! [Ba2Wcx]
//! LogLevel=debug
//! LogPath=C:\Temp\wcx-logs
//! ```
//!
//! `BA2WCX_LOG=<filter>` in the environment overrides `LogLevel` when the
//! log is installed (see [`crate::logging`]).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::LevelFilter;

pub const INI_SECTION: &str = "Ba2Wcx";
pub const LEVEL_ENV: &str = "BA2WCX_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub log_level: LevelFilter,
    /// Directory for log files. `None` disables the file log.
    pub log_dir: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            log_level: LevelFilter::Warn,
            log_dir: None,
        }
    }
}

impl PluginConfig {
    /// Read `[Ba2Wcx]` from `ini_path`. A missing or unreadable file yields defaults,
    /// with logs placed next to the ini file.
    pub fn from_ini(ini_path: &Path) -> Self {
        let ini_dir = ini_path.parent().filter(|p| !p.as_os_str().is_empty());
        match fs::read(ini_path) {
            Ok(bytes) => Self::parse_ini(&String::from_utf8_lossy(&bytes), ini_dir),
            Err(_) => PluginConfig {
                log_dir: ini_dir.map(Path::to_path_buf),
                ..Self::default()
            },
        }
    }

    pub fn parse_ini(contents: &str, ini_dir: Option<&Path>) -> Self {
        let mut config = PluginConfig {
            log_dir: ini_dir.map(Path::to_path_buf),
            ..Self::default()
        };

        let mut in_section = false;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = name.trim().eq_ignore_ascii_case(INI_SECTION);
                continue;
            }
            if !in_section {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            if key.trim().eq_ignore_ascii_case("LogLevel") {
                if let Some(level) = parse_level(value) {
                    config.log_level = level;
                }
            } else if key.trim().eq_ignore_ascii_case("LogPath") && !value.is_empty() {
                config.log_dir = Some(PathBuf::from(value));
            }
        }

        config
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

static CONFIG: OnceLock<PluginConfig> = OnceLock::new();

/// Install the process-wide configuration. Returns `false` when one is already
/// installed; the first value stays.
pub fn init(config: PluginConfig) -> bool {
    CONFIG.set(config).is_ok()
}

/// The installed configuration, or defaults when nothing was installed yet.
pub fn get() -> &'static PluginConfig {
    CONFIG.get_or_init(PluginConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_section_case_insensitively() {
        let ini = "\
[Configuration]
LogLevel=trace

; comment
[ba2wcx]
# another comment
loglevel = Debug
LOGPATH = /var/log/wcx
";
        let config = PluginConfig::parse_ini(ini, Some(Path::new("/etc/tc")));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/wcx")));
    }

    #[test]
    fn defaults_when_section_missing_or_values_bad() {
        let config = PluginConfig::parse_ini("[Other]\nLogLevel=trace\n", Some(Path::new("/etc/tc")));
        assert_eq!(config.log_level, LevelFilter::Warn);
        assert_eq!(config.log_dir, Some(PathBuf::from("/etc/tc")));

        let config = PluginConfig::parse_ini("[Ba2Wcx]\nLogLevel=loud\nLogPath=\nbroken line\n", None);
        assert_eq!(config, PluginConfig::default());
    }

    #[test]
    fn from_ini_file() {
        let dir = tempfile::tempdir().unwrap();
        let ini = dir.path().join("wcx.ini");
        let mut file = fs::File::create(&ini).unwrap();
        writeln!(file, "[Ba2Wcx]\r\nLogLevel=off\r").unwrap();
        drop(file);

        let config = PluginConfig::from_ini(&ini);
        assert_eq!(config.log_level, LevelFilter::Off);
        assert_eq!(config.log_dir.as_deref(), Some(dir.path()));

        let missing = PluginConfig::from_ini(&dir.path().join("absent.ini"));
        assert_eq!(missing.log_level, LevelFilter::Warn);
        assert_eq!(missing.log_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn first_installed_config_wins() {
        let config = PluginConfig {
            log_level: LevelFilter::Info,
            log_dir: None,
        };
        assert!(init(config.clone()));
        assert!(!init(PluginConfig::default()));
        assert_eq!(get(), &config);
    }
}
