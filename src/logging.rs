/// Diagnostic log setup
///
/// Every run starts with an empty log file. Events go to that file (plain
/// text) and to stderr. `RUST_LOG` overrides the default filter.

use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_FILTER: &str = "betacrew_client=info";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Create or truncate the log file
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let open = || -> io::Result<File> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        File::create(path)
    };
    open().map_err(|source| LoggingError::Open {
        path: path.display().to_string(),
        source,
    })
}

/// Install the global subscriber. Call once, before any network activity.
pub fn init(log_path: &Path) -> Result<(), LoggingError> {
    let file = open_log_file(log_path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(fmt::layer().with_writer(io::stderr))
        .try_init()?;
    Ok(())
}
