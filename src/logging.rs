//! Logging for test runs.
//!
//! Re-exports tracing macros with log_* naming, and provides the explicit
//! process-wide initialization for a suite: console output plus a
//! timestamped log file. Initialization happens once; the returned
//! [`LoggingGuard`] owns the file writer's worker thread and flushing
//! happens when the guard is dropped at suite end.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros with log_* naming
pub use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    trace as log_trace,
    warn as log_warn,
};

static LOGGING_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Options for suite-wide logging.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for the timestamped log file.
    pub dir: PathBuf,
    /// Whether to write the log file in addition to console output.
    pub file: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("test_logs"),
            file: true,
        }
    }
}

/// Keeps the non-blocking file writer alive for the duration of the run.
///
/// Dropping the guard flushes buffered log lines; hold it until the suite
/// is done.
pub struct LoggingGuard {
    _file_worker: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialize suite-wide logging: console, and a `test_YYYYmmdd_HHMMSS.log`
/// file under `options.dir` when file output is enabled.
///
/// Safe to call from every test binary; only the first call installs the
/// subscriber, later calls return a guard with no file worker.
pub fn init_logging(options: &LogOptions) -> LoggingGuard {
    let mut file_worker = None;

    let initialized = LOGGING_INITIALIZED.set(()).is_ok();
    if initialized {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&options.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let file_layer = if options.file {
            match open_log_file(options) {
                Some((writer, guard)) => {
                    file_worker = Some(guard);
                    Some(fmt::layer().with_writer(writer).with_ansi(false))
                }
                None => None,
            }
        } else {
            None
        };

        // try_init rather than init: another subscriber (e.g. a test
        // framework's) may already be installed in this process.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .with(file_layer)
            .try_init();

        log_info!(
            level = %options.level,
            file_output = options.file,
            "Test logging initialized"
        );
    }

    LoggingGuard {
        _file_worker: file_worker,
    }
}

fn open_log_file(
    options: &LogOptions,
) -> Option<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    if let Err(e) = std::fs::create_dir_all(&options.dir) {
        eprintln!(
            "ragcheck: could not create log directory {}: {}",
            options.dir.display(),
            e
        );
        return None;
    }

    let file_name = format!("test_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = options.dir.join(&file_name);

    match std::fs::File::create(&path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            Some((writer, guard))
        }
        Err(e) => {
            eprintln!("ragcheck: could not create log file {}: {}", path.display(), e);
            None
        }
    }
}
