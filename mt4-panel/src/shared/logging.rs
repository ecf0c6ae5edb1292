/// Tracing setup for the binaries
///
/// The panel owns the terminal, so its log lines go to a file. The logger
/// binary prints its result on stdout and logs to stderr.
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file used when none is configured: `<tmp>/mt4-panel.log`
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("mt4-panel.log")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Send all log output to `path`, appending
pub fn init_file_logging(path: &Path) -> io::Result<()> {
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

/// Send all log output to stderr
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}
