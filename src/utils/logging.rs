use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{ fmt::{ self }, prelude::*, EnvFilter, filter::LevelFilter };
use tracing_appender::rolling::{ RollingFileAppender, Rotation };
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{ LogConfig, LogRotation };

// Store multiple guards to keep all loggers alive
struct LogGuards {
    _file_guard: WorkerGuard,
    _console_guard: Option<WorkerGuard>,
}

// Set once, never freed
static LOG_GUARDS: OnceLock<LogGuards> = OnceLock::new();

/// Initialize the logging system with a non-blocking rolling file and optional console output.
///
/// `console` must stay false while the terminal UI owns the screen.
pub fn init_logging(level: Level, console: bool, log_config: &LogConfig) -> io::Result<()> {
    // Create log directory if it doesn't exist
    if !log_config.directory.exists() {
        std::fs::create_dir_all(&log_config.directory).map_err(|e| {
            eprintln!("Failed to create log directory: {}", e);
            e
        })?;
    }

    // Convert rotation enum to tracing_appender rotation
    let rotation = match log_config.rotation {
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    };

    // Rolling appender appends the date suffix itself
    let filename = format!("{}.log", log_config.filename_prefix);
    let file_appender = RollingFileAppender::new(rotation, &log_config.directory, filename);

    // Create non-blocking writer for file
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt
        ::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE);

    let level_filter = LevelFilter::from_level(level);

    // RUST_LOG directives still apply on top of the configured level
    let filter = EnvFilter::from_default_env().add_directive(level_filter.into());

    let console_guard = if console {
        let (console_writer, console_guard) = tracing_appender::non_blocking(io::stdout());

        let console_layer = fmt
            ::layer()
            .with_writer(console_writer)
            .with_ansi(true)
            .with_target(true)
            .compact();

        tracing_subscriber::registry().with(filter).with(file_layer).with(console_layer).init();
        Some(console_guard)
    } else {
        tracing_subscriber::registry().with(filter).with(file_layer).init();
        None
    };

    let _ = LOG_GUARDS.set(LogGuards {
        _file_guard: file_guard,
        _console_guard: console_guard,
    });

    // Clean up old log files if max_files is specified
    if let Some(max_files) = log_config.max_files {
        if
            let Err(e) = cleanup_old_logs(
                &log_config.directory,
                &log_config.filename_prefix,
                max_files
            )
        {
            // Don't fail initialization if cleanup fails, just log the error
            tracing::warn!("Failed to clean up old log files: {}", e);
        }
    }

    tracing::info!(
        log_dir = %log_config.directory.display(),
        log_prefix = %log_config.filename_prefix,
        "Asynchronous logging initialized at level: {:?}",
        level
    );

    Ok(())
}

/// Clean up old log files to keep only the most recent ones
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_files: usize) -> io::Result<()> {
    let mut entries = std::fs
        ::read_dir(log_dir)?
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            // Only consider files with the correct prefix
            if path.is_file() && path.file_name()?.to_string_lossy().starts_with(prefix) {
                return Some((path, entry.metadata().ok()?.modified().ok()?));
            }
            None
        })
        .collect::<Vec<_>>();

    if entries.len() > max_files {
        // Sort by modified time (newest first)
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        // Delete the oldest files
        for (path, _) in entries.iter().skip(max_files) {
            std::fs::remove_file(path)?;
        }
    }

    Ok(())
}
