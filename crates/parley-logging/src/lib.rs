//! JSONL and console logging for Parley
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines for log aggregation (default)
//! - **Pretty Output**: Human-readable console output for interactive use
//! - **Viewer Context**: Work instrumented with [`ViewerContextGuard::span`]
//!   logs the viewer and session id on every event
//! - **Session Files**: One JSONL file per client session via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use parley_logging::{LogConfig, ParleySubscriberBuilder};
//!
//! // JSONL to console
//! let _guard = ParleySubscriberBuilder::new().init();
//!
//! // Warnings only, human-readable
//! let _guard = ParleySubscriberBuilder::new()
//!     .with_config(LogConfig::interactive(true))
//!     .init();
//! ```

pub mod config;
pub mod context;
pub mod error;

pub use config::{ConsoleFormat, FileConfig, LogConfig};
pub use context::{ViewerContextData, ViewerContextGuard};
pub use error::{LoggingError, LoggingResult};
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use tracing_appender::non_blocking::NonBlocking;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builder for configuring and initializing the Parley logging subscriber
///
/// By default, console output uses JSONL format. Use
/// [`LogConfig::interactive`] for terminal tools and [`LogConfig::session`]
/// to log a client session to a file.
pub struct ParleySubscriberBuilder {
    config: LogConfig,
}

impl ParleySubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Set the console format
    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console = format;
        self
    }

    /// The configuration that will be installed
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn env_filter(&self) -> LoggingResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.config.default_level)
                .map_err(|e| LoggingError::InvalidFilter(e.to_string())),
        }
    }

    fn console_layer(&self) -> Option<BoxedLayer> {
        match self.config.console {
            ConsoleFormat::Jsonl => Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .flatten_event(true)
                    .boxed(),
            ),
            ConsoleFormat::Pretty => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .boxed(),
            ),
            ConsoleFormat::Off => None,
        }
    }

    fn file_layer(writer: NonBlocking) -> BoxedLayer {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .flatten_event(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(writer)
            .boxed()
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns the file writer guard when file output is configured; keep it
    /// alive for the duration of the program.
    pub fn try_init(self) -> LoggingResult<Option<WorkerGuard>> {
        let env_filter = self.env_filter()?;
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if let Some(console) = self.console_layer() {
            layers.push(console);
        }
        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = create_file_writer(file_config)?;
            layers.push(Self::file_layer(writer));
            guard = Some(file_guard);
        }

        Registry::default()
            .with(layers)
            .with(env_filter)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// Failures are reported on stderr and leave logging as it was.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }
}

impl Default for ParleySubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a non-blocking writer over a freshly truncated log file
fn create_file_writer(file_config: &FileConfig) -> LoggingResult<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&file_config.directory)?;
    let file = File::create(file_config.path())?;
    Ok(tracing_appender::non_blocking(file))
}
