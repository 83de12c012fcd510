//! Tracing configuration and log routing.
//!
//! Both binaries filter through `RUST_LOG`. The server logs compactly to stdout and also to
//! a file: `FERNSUM_LOG_FILE` when set, otherwise `logs/fernsum.log`. The command-line tool
//! logs to stderr only, since stdout carries the summary.
use std::{io, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    prelude::*,
    registry::LookupSpan,
};

const LOG_FILE_ENV: &str = "FERNSUM_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "fernsum.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where console output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Console {
    Stdout,
    Stderr,
}

/// Configure tracing for the HTTP server: stdout plus a non-blocking file layer.
///
/// Defaults to `info` when `RUST_LOG` is unset. When the log file cannot be opened, logging
/// continues on stdout alone.
pub fn init_tracing() {
    install(Console::Stdout, "info", configure_file_writer());
}

/// Configure tracing for the command-line tool: stderr only, defaulting to `warn`.
pub fn init_cli_tracing() {
    install(Console::Stderr, "warn", None);
}

fn install(console: Console, default_level: &str, file: Option<NonBlocking>) {
    let file_layer = file.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });
    let registry = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(file_layer);

    match console {
        Console::Stdout => registry.with(console_layer(io::stdout)).init(),
        Console::Stderr => registry.with(console_layer(io::stderr)).init(),
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn console_layer<S, W>(writer: W) -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    fmt::layer().with_writer(writer).with_target(false).compact()
}

/// Build a non-blocking writer for file logging.
///
/// Returns `None` when the target file or the default logs directory is unusable.
fn configure_file_writer() -> Option<NonBlocking> {
    let file = match std::env::var(LOG_FILE_ENV) {
        Ok(path) => open_append(Path::new(&path)),
        Err(_) => std::fs::create_dir_all(DEFAULT_LOG_DIR)
            .and_then(|()| open_append(&Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE))),
    };
    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(non_blocking)
        }
        Err(err) => {
            eprintln!("File logging disabled: {err}");
            None
        }
    }
}

fn open_append(path: &Path) -> io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| io::Error::new(err.kind(), format!("{}: {err}", path.display())))
}
