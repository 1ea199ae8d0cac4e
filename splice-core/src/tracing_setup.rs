//! Tracing setup for Splice
//!
//! Console logs at the user's chosen level, plus a trace log on disk for the
//! last run so playback sequencing problems can be reconstructed later.
//! HTTP plumbing crates stay quiet on the console unless tracing is requested.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Name of the per-run log file inside the logs directory.
pub const LOG_FILE_NAME: &str = "splice-last-run.log";

const SPLICE_TARGETS: [&str; 4] = ["splice_core", "splice_web", "splice_listing", "splice"];

const DEPENDENCY_TARGETS: [&str; 5] = ["hyper", "hyper_util", "h2", "reqwest", "tower_http"];

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("Cannot prepare log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Filter directives for console output at `level`.
///
/// Splice crates log at `level`. Dependencies are capped at `warn` below
/// `trace`. At `debug`, playback sequencing is raised to `trace`.
pub fn console_directives(level: Level) -> String {
    let mut directives = vec![level.to_string().to_lowercase()];

    if level < Level::TRACE {
        let capped = if level < Level::WARN { level } else { Level::WARN };
        for target in DEPENDENCY_TARGETS {
            directives.push(format!("{target}={}", capped.to_string().to_lowercase()));
        }
    }

    if level == Level::DEBUG {
        directives.push("splice_core::playback=trace".to_string());
    }

    directives.join(",")
}

/// Filter directives for the on-disk log: everything from Splice, `debug`
/// from dependencies.
pub fn file_directives() -> String {
    let mut directives = vec!["debug".to_string()];
    directives.extend(SPLICE_TARGETS.iter().map(|target| format!("{target}=trace")));
    directives.join(",")
}

/// Initialize tracing with dual output: console (user level) + file (full trace)
///
/// `RUST_LOG` replaces the console directives when set. Writes the file log
/// to `<logs_dir>/splice-last-run.log` (default `./logs`), overwriting the
/// previous run, and returns its path.
///
/// # Errors
///
/// - `TracingSetupError::LogFile` - Logs directory or log file cannot be created
/// - `TracingSetupError::AlreadyInitialized` - Another subscriber was installed first
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<PathBuf, TracingSetupError> {
    let log_file_path = logs_dir
        .unwrap_or_else(|| Path::new("logs"))
        .join(LOG_FILE_NAME);
    let log_file = open_log_file(&log_file_path)?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_directives(console_level)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(EnvFilter::new(file_directives()));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| TracingSetupError::AlreadyInitialized)?;

    tracing::info!(
        "Tracing initialized: console={}, debug_file={}",
        console_level,
        log_file_path.display()
    );

    Ok(log_file_path)
}

fn open_log_file(path: &Path) -> Result<File, TracingSetupError> {
    let to_error = |source| TracingSetupError::LogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        create_dir_all(parent).map_err(to_error)?;
    }
    File::create(path).map_err(to_error)
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Debug, informational, warning, and error messages
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    ///
    /// # Examples
    /// ```
    /// use splice_core::tracing_setup::CliLogLevel;
    ///
    /// let level = CliLogLevel::Info.as_tracing_level();
    /// assert_eq!(level, tracing::Level::INFO);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}
