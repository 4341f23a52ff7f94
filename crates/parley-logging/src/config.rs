//! Where Parley logs go and how they look

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Rendering of console output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// Human-readable, colored lines
    Pretty,
    /// No console output
    Off,
}

/// Logging configuration for a Parley process
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is not set
    pub default_level: String,
    pub console: ConsoleFormat,
    /// JSONL session log, written next to (or instead of) the console
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleFormat::Jsonl,
            file: None,
        }
    }
}

impl LogConfig {
    /// Quiet console logging for interactive tools
    ///
    /// Only warnings reach the terminal, where they interleave with the
    /// tool's own output; `pretty` swaps JSONL for readable lines.
    pub fn interactive(pretty: bool) -> Self {
        Self {
            default_level: "warn".to_string(),
            console: if pretty {
                ConsoleFormat::Pretty
            } else {
                ConsoleFormat::Jsonl
            },
            file: None,
        }
    }

    /// Record one client session to its own file and keep the console quiet
    ///
    /// Sync traffic is logged at debug so a session can be replayed from the
    /// file alone.
    pub fn session(directory: impl Into<PathBuf>, session_id: Uuid) -> Self {
        Self {
            default_level: "parley_sync=debug,parley_store=debug,info".to_string(),
            console: ConsoleFormat::Off,
            file: Some(FileConfig::for_session(directory, session_id)),
        }
    }
}

/// A single JSONL log file, created fresh on start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name without the `.log` extension
    pub name: String,
}

impl FileConfig {
    /// `parley-<session>.log` inside `directory`
    pub fn for_session(directory: impl Into<PathBuf>, session_id: Uuid) -> Self {
        Self {
            directory: directory.into(),
            name: format!("parley-{}", session_id.simple()),
        }
    }

    /// Full path of the log file
    pub fn path(&self) -> PathBuf {
        Path::new(&self.directory).join(format!("{}.log", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert_eq!(config.console, ConsoleFormat::Jsonl);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_interactive_config() {
        assert_eq!(LogConfig::interactive(true).console, ConsoleFormat::Pretty);
        let quiet = LogConfig::interactive(false);
        assert_eq!(quiet.console, ConsoleFormat::Jsonl);
        assert_eq!(quiet.default_level, "warn");
    }

    #[test]
    fn test_session_file_is_named_after_session() {
        let session = Uuid::new_v4();
        let config = LogConfig::session("/tmp/parley", session);
        assert_eq!(config.console, ConsoleFormat::Off);

        let file = config.file.unwrap();
        assert_eq!(
            file.path(),
            PathBuf::from(format!("/tmp/parley/parley-{}.log", session.simple()))
        );
    }
}
