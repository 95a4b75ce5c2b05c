//! Logging init: append to a log file under the XDG state dir, or fall back
//! to stderr when the file cannot be opened.
//!
//! Every engine event (attempts, retries, outcomes, progress, summaries) goes
//! through `tracing`; this module only decides where it lands.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Writer that is either a file or stderr (used when the file handle cannot be cloned).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

/// `~/.local/state/tokgen/tokgen.log`.
pub fn default_log_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tokgen")?;
    Ok(xdg_dirs.get_state_home().join("tokgen.log"))
}

/// Filter directive for a `-v` count when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn,tokgen=info,tokgen_core=info",
        1 => "info,tokgen=debug,tokgen_core=debug",
        _ => "debug,tokgen=trace,tokgen_core=trace",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log dir {}", dir.display()))?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Install the global subscriber for `target`.
/// Returns Err if the log file cannot be opened so the caller can fall back to stderr.
pub fn init(target: &LogTarget, verbosity: u8) -> Result<()> {
    let writer = match target {
        LogTarget::File(path) => BoxMakeWriter::new(FileMakeWriter(open_log_file(path)?)),
        LogTarget::Stderr => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging already initialized: {}", e))?;

    if let LogTarget::File(path) = target {
        tracing::info!("tokgen logging initialized at {}", path.display());
    }
    Ok(())
}

/// Log to the default file, or to stderr if that is not possible.
pub fn init_default(verbosity: u8) -> LogTarget {
    let file_target = default_log_path().map(LogTarget::File);
    if let Ok(target) = file_target {
        if init(&target, verbosity).is_ok() {
            return target;
        }
    }
    let _ = init(&LogTarget::Stderr, verbosity);
    LogTarget::Stderr
}
